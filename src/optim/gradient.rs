//! Cost and gradient of the projection matrix over the current vertex set.
use super::OptimizerContext;
use crate::camera::{CalibrationModel, ProjectionMatrix};
use crate::error::{CalibError, Result};
use crate::image::{bilinear, ImageF64};

/// Output of one cost/gradient evaluation.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub cost: f64,
    /// Gradient of the alignment score; its positive direction lowers the cost.
    pub gradient: ProjectionMatrix,
    pub uv: Vec<[f64; 2]>,
    /// Field derivatives at `uv`, `None` where the sample does not exist.
    pub sampled_x: Vec<Option<f64>>,
    pub sampled_y: Vec<Option<f64>>,
    /// Vertices that contributed to the gradient.
    pub valid_count: usize,
}

/// Project the vertices with `p`, score them and accumulate
/// `Σ wᵢ·(∂F/∂x·∂u/∂P + ∂F/∂y·∂v/∂P)` over vertices whose field derivatives
/// can be sampled.
///
/// The first two rows are averaged over the contributing vertices; the
/// third row is left at zero. Fails with
/// [`CalibError::InsufficientFeatures`] when no vertex contributes and with
/// [`CalibError::MalformedInput`] when the projection model does not return
/// one pixel per vertex.
pub fn evaluate(
    ctx: &OptimizerContext<'_>,
    model: &CalibrationModel,
    p: &ProjectionMatrix,
) -> Result<Evaluation> {
    let uv = ctx.projection.project(ctx.vertices, model, p);
    if uv.len() != ctx.vertices.len() {
        return Err(CalibError::malformed(format!(
            "projection returned {} pixels for {} vertices",
            uv.len(),
            ctx.vertices.len()
        )));
    }
    let cost = ctx.cost.cost(ctx.weights, ctx.field, &uv);

    let grad = &ctx.field.grad;
    let sample = |img: &ImageF64| -> Vec<Option<f64>> {
        uv.iter().map(|&[u, v]| bilinear(img, u, v)).collect()
    };
    let sampled_x = sample(&grad.gx);
    let sampled_y = sample(&grad.gy);

    let mut sums = [0.0f64; 12];
    let mut valid_count = ctx.vertices.len();
    for (i, vertex) in ctx.vertices.iter().enumerate() {
        let (Some(dx), Some(dy)) = (sampled_x[i], sampled_y[i]) else {
            valid_count -= 1;
            continue;
        };
        let w = ctx.weights.get(i).copied().unwrap_or(0.0);
        let (xc, yc) = ctx.projection.coefficients(vertex, model, p);
        for j in 0..12 {
            sums[j] += w * (dx * xc[j] + dy * yc[j]);
        }
    }
    if valid_count == 0 {
        return Err(CalibError::InsufficientFeatures {
            stage: "gradient accumulation",
            count: 0,
        });
    }

    let mut gradient = ProjectionMatrix::zeros();
    for j in 0..8 {
        gradient.vals[j] = sums[j] / valid_count as f64;
    }

    Ok(Evaluation {
        cost,
        gradient,
        uv,
        sampled_x,
        sampled_y,
        valid_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Extrinsics, Intrinsics, PinholeProjection, PixelCoefficients, ProjectionModel};
    use crate::edges::DiffusedField;
    use crate::optim::EdgeAlignmentCost;
    use crate::session::params::{LineSearchParams, OptimizerParams};
    use nalgebra::Vector3;

    struct Fixture {
        model: CalibrationModel,
        field: DiffusedField,
        weights: Vec<f64>,
        line_search: LineSearchParams,
        limits: OptimizerParams,
    }

    impl Fixture {
        fn new() -> Self {
            let mut edges = ImageF64::new(32, 24);
            for y in 0..24 {
                edges.set(18, y, 90.0);
            }
            Self {
                model: CalibrationModel {
                    intrinsics: Intrinsics {
                        width: 32,
                        height: 24,
                        fx: 40.0,
                        fy: 40.0,
                        ppx: 16.0,
                        ppy: 12.0,
                        coeffs: [0.0; 5],
                    },
                    extrinsics: Extrinsics::default(),
                },
                field: DiffusedField::build(&edges, 0.9, 1.0 / 3.0),
                weights: vec![1.0; 4],
                line_search: LineSearchParams::default(),
                limits: OptimizerParams::default(),
            }
        }

        fn ctx<'a>(
            &'a self,
            vertices: &'a [Vector3<f64>],
            projection: &'a dyn ProjectionModel,
        ) -> OptimizerContext<'a> {
            OptimizerContext {
                vertices,
                weights: &self.weights[..vertices.len()],
                field: &self.field,
                reference: &self.model,
                projection,
                cost: &EdgeAlignmentCost,
                line_search: &self.line_search,
                limits: &self.limits,
            }
        }
    }

    /// Pinhole model that loses the last projected pixel.
    struct Truncating;

    impl ProjectionModel for Truncating {
        fn decompose(&self, p: &ProjectionMatrix, reference: &CalibrationModel) -> CalibrationModel {
            PinholeProjection.decompose(p, reference)
        }

        fn project(
            &self,
            vertices: &[Vector3<f64>],
            model: &CalibrationModel,
            p: &ProjectionMatrix,
        ) -> Vec<[f64; 2]> {
            let mut uv = PinholeProjection.project(vertices, model, p);
            uv.pop();
            uv
        }

        fn coefficients(
            &self,
            vertex: &Vector3<f64>,
            model: &CalibrationModel,
            p: &ProjectionMatrix,
        ) -> PixelCoefficients {
            PinholeProjection.coefficients(vertex, model, p)
        }
    }

    #[test]
    fn centred_vertex_contributes() {
        let fixture = Fixture::new();
        let vertices = [Vector3::new(0.0, 0.0, 1000.0)];
        let ctx = fixture.ctx(&vertices, &PinholeProjection);
        let eval = evaluate(&ctx, &fixture.model, &fixture.model.to_projection()).unwrap();
        assert_eq!(eval.valid_count, 1);
        assert!((eval.uv[0][0] - 16.0).abs() < 1e-9);
        assert!(eval.sampled_x[0].is_some() && eval.sampled_y[0].is_some());
        assert!(eval.gradient.vals[8..].iter().all(|&g| g == 0.0));
    }

    #[test]
    fn off_image_vertices_leave_nothing_to_accumulate() {
        let fixture = Fixture::new();
        let vertices = [
            Vector3::new(5000.0, 0.0, 1000.0),
            Vector3::new(0.0, -4000.0, 1000.0),
        ];
        let ctx = fixture.ctx(&vertices, &PinholeProjection);
        let err = evaluate(&ctx, &fixture.model, &fixture.model.to_projection()).unwrap_err();
        assert!(matches!(
            err,
            CalibError::InsufficientFeatures {
                stage: "gradient accumulation",
                count: 0
            }
        ));
    }

    #[test]
    fn short_projection_output_is_malformed() {
        let fixture = Fixture::new();
        let vertices = [Vector3::new(0.0, 0.0, 1000.0), Vector3::new(10.0, 0.0, 1000.0)];
        let ctx = fixture.ctx(&vertices, &Truncating);
        let err = evaluate(&ctx, &fixture.model, &fixture.model.to_projection()).unwrap_err();
        assert!(matches!(err, CalibError::MalformedInput(_)));
    }
}

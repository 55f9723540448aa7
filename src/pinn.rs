//! 4項損失の組み立て。
//!
//! 物理残差・初期条件・初速度条件・データ適合の各項を独立に計算し、
//! 固定重みの加重和として総損失を構成します。すべて (モデル, 評価点集合,
//! 物理系, 重み) の純関数で、共有状態を参照しません。

use burn::backend::Autodiff;
use burn::nn::loss::{MseLoss, Reduction};
use burn::prelude::Backend;
use burn::tensor::Tensor;

use crate::config::{LossWeights, PendulumSystem};
use crate::error::PinnError;
use crate::grad::partial;
use crate::model::PendulumNet;

/// 1反復分の損失計算に使う評価点の集合。
///
/// - `t_physics`: 残差を評価する内部コロケーション点（参照解の全時間格子）
/// - `t_zero`: 境界点 t = 0（1点固定）
/// - `t_data`, `theta_data`: ノイズを含む観測データ
#[derive(Debug, Clone)]
pub struct PinnBatch<B: Backend> {
    pub t_physics: Tensor<B, 2>,
    pub t_zero: Tensor<B, 2>,
    pub t_data: Tensor<B, 2>,
    pub theta_data: Tensor<B, 2>,
}

/// θ'(t) を計算します。
///
/// モデルと入力を `Autodiff` 1段上へ持ち上げてから微分するため、
/// 返り値は元のバックエンドの計算グラフに属したままで、学習時には
/// パラメータへ逆伝播できます。
pub fn velocity<B: Backend>(
    model: &PendulumNet<B>,
    t: Tensor<B, 2>,
) -> Result<Tensor<B, 2>, PinnError> {
    let t_lift = Tensor::<Autodiff<B>, 2>::from_inner(t).require_grad();
    let theta = model.lift().forward(t_lift.clone());
    partial(theta, &t_lift)
}

/// θ''(t) を計算します。微分演算子を2回合成するため2段持ち上げます。
pub fn second_derivative<B: Backend>(
    model: &PendulumNet<B>,
    t: Tensor<B, 2>,
) -> Result<Tensor<B, 2>, PinnError> {
    let t_lift = Tensor::<Autodiff<B>, 2>::from_inner(t).require_grad();
    let t_lift2 = Tensor::<Autodiff<Autodiff<B>>, 2>::from_inner(t_lift.clone()).require_grad();
    let theta = model.lift().lift().forward(t_lift2.clone());
    let dtheta = partial(theta, &t_lift2)?;
    partial(dtheta, &t_lift)
}

/// 運動方程式の残差 θ'' + (g/L)·sin θ。方程式を満たすとき 0 になります。
pub fn pendulum_residual<B: Backend>(
    theta: Tensor<B, 2>,
    theta_ddot: Tensor<B, 2>,
    system: &PendulumSystem,
) -> Tensor<B, 2> {
    theta_ddot + theta.sin().mul_scalar(system.gravity / system.rod_length)
}

/// 物理残差項: 内部コロケーション点での残差の二乗平均。
pub fn physics_loss<B: Backend>(
    model: &PendulumNet<B>,
    t_physics: Tensor<B, 2>,
    system: &PendulumSystem,
) -> Result<Tensor<B, 1>, PinnError> {
    let theta_ddot = second_derivative(model, t_physics.clone())?;
    let theta = model.forward(t_physics);
    let residual = pendulum_residual(theta, theta_ddot, system);
    Ok(MseLoss::new().forward(
        residual.clone(),
        Tensor::zeros_like(&residual),
        Reduction::Mean,
    ))
}

/// PINN の総損失 λ1·物理 + λ2·初期条件 + λ3·境界条件 + λ4·データ。
///
/// 4項すべてを同一のモデルインスタンスから1つの計算グラフ上で計算します。
pub fn pinn_loss<B: Backend>(
    model: &PendulumNet<B>,
    batch: &PinnBatch<B>,
    system: &PendulumSystem,
    weights: &LossWeights,
) -> Result<Tensor<B, 1>, PinnError> {
    let mse = MseLoss::new();

    let ode_loss = physics_loss(model, batch.t_physics.clone(), system)?;

    let pred0 = model.forward(batch.t_zero.clone());
    let target0 = Tensor::ones_like(&pred0).mul_scalar(system.theta0);
    let ic_loss = mse.forward(pred0, target0, Reduction::Mean);

    let vel0 = velocity(model, batch.t_zero.clone())?;
    let bc_loss = mse.forward(vel0.clone(), Tensor::zeros_like(&vel0), Reduction::Mean);

    let data_loss = mse.forward(
        model.forward(batch.t_data.clone()),
        batch.theta_data.clone(),
        Reduction::Mean,
    );

    Ok(ode_loss.mul_scalar(weights.physics)
        + ic_loss.mul_scalar(weights.initial)
        + bc_loss.mul_scalar(weights.boundary)
        + data_loss.mul_scalar(weights.data))
}

/// データ適合のみのベースライン損失（λ = 1 の第4項のみ）。
pub fn data_only_loss<B: Backend>(
    model: &PendulumNet<B>,
    t_data: Tensor<B, 2>,
    theta_data: Tensor<B, 2>,
) -> Tensor<B, 1> {
    MseLoss::new().forward(model.forward(t_data), theta_data, Reduction::Mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;
    type B1 = Autodiff<B>;
    type B2 = Autodiff<B1>;

    #[test]
    fn analytic_small_amplitude_solution_has_zero_residual() {
        // 小振幅では θ(t) = θ0·cos(√(g/L)·t) が厳密解に漸近する。
        // 解析式を微分タワーに通し、残差がほぼ 0 になることを確認する。
        let device = Default::default();
        let system = PendulumSystem {
            theta0: 0.01,
            ..Default::default()
        };
        let omega = (system.gravity / system.rod_length).sqrt();
        let points = [[0.0], [0.4], [1.1], [2.3]];

        let t1 = Tensor::<B1, 2>::from_floats(points, &device).require_grad();
        let t2 = Tensor::<B2, 2>::from_inner(t1.clone()).require_grad();
        let theta_tracked = t2.clone().mul_scalar(omega).cos().mul_scalar(system.theta0);
        let dtheta = partial(theta_tracked, &t2).unwrap();
        let theta_ddot = partial(dtheta, &t1).unwrap();

        let theta = Tensor::<B, 2>::from_floats(points, &device)
            .mul_scalar(omega)
            .cos()
            .mul_scalar(system.theta0);
        let residual = pendulum_residual(theta, theta_ddot, &system);
        for value in residual.into_data().to_vec::<f32>().unwrap() {
            assert!(value.abs() < 1e-3, "residual {value} not near zero");
        }
    }

    #[test]
    fn velocity_matches_finite_difference() {
        let device = Default::default();
        let model = PendulumNet::<B>::new(&[1, 16, 16, 1], &device).unwrap();
        let eval = |x: f32| -> f32 {
            model
                .forward(Tensor::<B, 2>::from_floats([[x]], &device))
                .into_scalar()
        };
        let (t, h) = (0.37f32, 0.01f32);
        let fd = (eval(t + h) - eval(t - h)) / (2.0 * h);
        let v: f32 = velocity(&model, Tensor::<B, 2>::from_floats([[t]], &device))
            .unwrap()
            .into_scalar();
        assert!((v - fd).abs() < 1e-2 * (1.0 + fd.abs()), "{v} vs {fd}");
    }

    #[test]
    fn second_derivative_matches_finite_difference() {
        let device = Default::default();
        let model = PendulumNet::<B>::new(&[1, 16, 16, 1], &device).unwrap();
        let eval = |x: f32| -> f32 {
            model
                .forward(Tensor::<B, 2>::from_floats([[x]], &device))
                .into_scalar()
        };
        let (t, h) = (0.81f32, 0.05f32);
        let fd = (eval(t + h) - 2.0 * eval(t) + eval(t - h)) / (h * h);
        let a: f32 = second_derivative(&model, Tensor::<B, 2>::from_floats([[t]], &device))
            .unwrap()
            .into_scalar();
        assert!((a - fd).abs() < 5e-2 * (1.0 + fd.abs()), "{a} vs {fd}");
    }

    #[test]
    fn pinn_loss_is_finite_and_non_negative() {
        let device = Default::default();
        let system = PendulumSystem::default();
        let weights = LossWeights::default();
        let model = PendulumNet::<B>::new(&[1, 8, 8, 1], &device).unwrap();
        let batch = PinnBatch {
            t_physics: Tensor::from_floats([[0.0], [0.5], [1.0], [1.5], [2.0]], &device),
            t_zero: Tensor::zeros([1, 1], &device),
            t_data: Tensor::from_floats([[0.1], [0.6], [1.2]], &device),
            theta_data: Tensor::from_floats([[0.7], [0.2], [-0.4]], &device),
        };
        let loss: f32 = pinn_loss(&model, &batch, &system, &weights)
            .unwrap()
            .into_scalar();
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }

    #[test]
    fn data_only_loss_is_zero_for_perfect_fit() {
        // [1,1] 構成の恒等的な写像でターゲットを自身の出力にすると損失 0
        let device = Default::default();
        let model = PendulumNet::<B>::new(&[1, 1], &device).unwrap();
        let t = Tensor::<B, 2>::from_floats([[0.2], [0.9]], &device);
        let target = model.forward(t.clone());
        let loss: f32 = data_only_loss(&model, t, target).into_scalar();
        assert!(loss.abs() < 1e-12);
    }
}

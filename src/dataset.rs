//! 参照軌道の生成と観測データの作成。
//!
//! 学習の外部協力者にあたる部分です。古典的な RK4 積分器で
//! θ'' = −(g/L)·sin θ の稠密な参照解を作り、ガウスノイズの付加・
//! 間引き・時間方向の切り詰めで疎な観測データを作ります。

use burn::prelude::Backend;
use burn::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::{DataConfig, PendulumSystem};
use crate::error::PinnError;
use crate::metrics::calculate_snr;

/// 1サンプル区間あたりの RK4 部分ステップ数
const RK4_SUBSTEPS: usize = 8;

/// 稠密な時間格子上の参照軌道。学習は角変位チャネルのみを使います。
#[derive(Debug, Clone)]
pub struct ReferenceTrajectory {
    pub time: Vec<f64>,
    pub theta: Vec<f64>,
    pub omega: Vec<f64>,
}

/// ノイズを含む間引き済みの観測データ。
#[derive(Debug, Clone)]
pub struct Observations {
    pub time: Vec<f64>,
    pub theta: Vec<f64>,
    /// 付加したノイズに対する信号対雑音比 (dB)
    pub snr_db: f64,
}

fn rhs(system: &PendulumSystem, theta: f64, omega: f64) -> (f64, f64) {
    (omega, -(system.gravity / system.rod_length) * theta.sin())
}

fn rk4_step(system: &PendulumSystem, theta: &mut f64, omega: &mut f64, dt: f64) {
    let (k1t, k1o) = rhs(system, *theta, *omega);
    let (k2t, k2o) = rhs(system, *theta + 0.5 * dt * k1t, *omega + 0.5 * dt * k1o);
    let (k3t, k3o) = rhs(system, *theta + 0.5 * dt * k2t, *omega + 0.5 * dt * k2o);
    let (k4t, k4o) = rhs(system, *theta + dt * k3t, *omega + dt * k3o);
    *theta += dt / 6.0 * (k1t + 2.0 * k2t + 2.0 * k3t + k4t);
    *omega += dt / 6.0 * (k1o + 2.0 * k2o + 2.0 * k3o + k4o);
}

/// 初期値問題を RK4 で解き、[0, t_end] を両端含む
/// `sample_freq · t_end` 点の格子上で参照軌道を返します。
pub fn solve_reference(system: &PendulumSystem, data: &DataConfig) -> ReferenceTrajectory {
    let n = (data.sample_freq as f64 * data.t_end) as usize;
    let mut time = Vec::with_capacity(n);
    let mut theta = Vec::with_capacity(n);
    let mut omega = Vec::with_capacity(n);

    let (mut th, mut om) = (system.theta0, system.omega0);
    time.push(0.0);
    theta.push(th);
    omega.push(om);
    for i in 1..n {
        let t_prev = data.t_end * (i - 1) as f64 / (n - 1) as f64;
        let t_next = data.t_end * i as f64 / (n - 1) as f64;
        let dt = (t_next - t_prev) / RK4_SUBSTEPS as f64;
        for _ in 0..RK4_SUBSTEPS {
            rk4_step(system, &mut th, &mut om, dt);
        }
        time.push(t_next);
        theta.push(th);
        omega.push(om);
    }
    ReferenceTrajectory { time, theta, omega }
}

/// 参照軌道からノイズを含む観測データを作ります。
///
/// 全軌道に N(0, noise_std) のノイズを付加した後、`cut_time` 秒までを
/// `resample` 点おきに間引きます。
pub fn observe(
    reference: &ReferenceTrajectory,
    data: &DataConfig,
) -> Result<Observations, PinnError> {
    let normal = Normal::new(0.0, data.noise_std)
        .map_err(|e| PinnError::Config(format!("invalid noise std {}: {e}", data.noise_std)))?;
    let mut rng = StdRng::seed_from_u64(data.noise_seed);

    let noise: Vec<f64> = reference.theta.iter().map(|_| normal.sample(&mut rng)).collect();
    let noisy: Vec<f64> = reference
        .theta
        .iter()
        .zip(&noise)
        .map(|(t, n)| t + n)
        .collect();
    let snr_db = calculate_snr(&noisy, &noise);

    let cut = ((data.cut_time * data.sample_freq as f64) as usize).min(noisy.len());
    let indices = (0..cut).step_by(data.resample.max(1));
    let time = indices.clone().map(|i| reference.time[i]).collect();
    let theta = indices.map(|i| noisy[i]).collect();

    Ok(Observations { time, theta, snr_db })
}

/// `Vec<f64>` を N×1 の列テンソルへ変換します。
pub fn to_column_tensor<B: Backend>(values: &[f64], device: &B::Device) -> Tensor<B, 2> {
    let floats: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let n = floats.len();
    Tensor::<B, 1>::from_floats(floats.as_slice(), device).reshape([n, 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn grid_covers_horizon_inclusively() {
        let system = PendulumSystem::default();
        let data = DataConfig::default();
        let reference = solve_reference(&system, &data);
        assert_eq!(reference.time.len(), 1000);
        assert_eq!(reference.theta.len(), 1000);
        assert_eq!(reference.time[0], 0.0);
        assert!((reference.time[999] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn small_amplitude_matches_analytic_solution() {
        let system = PendulumSystem {
            theta0: 0.01,
            ..Default::default()
        };
        let data = DataConfig::default();
        let omega = (system.gravity / system.rod_length).sqrt();
        let reference = solve_reference(&system, &data);
        for (t, th) in reference.time.iter().zip(&reference.theta) {
            let analytic = system.theta0 * (omega * t).cos();
            assert!((th - analytic).abs() < 1e-4, "t={t}: {th} vs {analytic}");
        }
    }

    #[test]
    fn integrator_conserves_energy() {
        let system = PendulumSystem::default();
        let data = DataConfig::default();
        let reference = solve_reference(&system, &data);
        let energy = |theta: f64, omega: f64| {
            0.5 * omega * omega - (system.gravity / system.rod_length) * theta.cos()
        };
        let e0 = energy(reference.theta[0], reference.omega[0]);
        for (th, om) in reference.theta.iter().zip(&reference.omega) {
            assert!((energy(*th, *om) - e0).abs() < 1e-6);
        }
    }

    #[test]
    fn observations_are_truncated_and_downsampled() {
        // 2.5s @ 100Hz を5点おきに間引くと50点
        let system = PendulumSystem::default();
        let data = DataConfig::default();
        let reference = solve_reference(&system, &data);
        let obs = observe(&reference, &data).unwrap();
        assert_eq!(obs.time.len(), 50);
        assert!(obs.time.iter().all(|&t| t < 2.5));
        assert!(obs.snr_db.is_finite());
    }

    #[test]
    fn observation_noise_is_seeded() {
        let system = PendulumSystem::default();
        let data = DataConfig::default();
        let reference = solve_reference(&system, &data);
        let a = observe(&reference, &data).unwrap();
        let b = observe(&reference, &data).unwrap();
        assert_eq!(a.theta, b.theta);
    }

    #[test]
    fn zero_noise_reproduces_reference_subset() {
        let system = PendulumSystem::default();
        let data = DataConfig {
            noise_std: 0.0,
            ..Default::default()
        };
        let reference = solve_reference(&system, &data);
        let obs = observe(&reference, &data).unwrap();
        for (i, value) in obs.theta.iter().enumerate() {
            assert_eq!(*value, reference.theta[i * data.resample]);
        }
    }

    #[test]
    fn column_tensor_has_expected_shape() {
        let device = Default::default();
        let tensor = to_column_tensor::<NdArray<f32>>(&[0.0, 0.5, 1.0], &device);
        assert_eq!(tensor.dims(), [3, 1]);
    }
}

//! 評価指標。相対 L2 誤差と信号対雑音比。

use burn::prelude::Backend;
use burn::tensor::{ElementConversion, Tensor};

/// 相対 L2 誤差 ‖prediction − reference‖₂ / ‖reference‖₂ を返します。
///
/// (モデル出力, 参照解) の純関数で、副作用はありません。
pub fn relative_l2_error<B: Backend>(
    prediction: &Tensor<B, 2>,
    reference: &Tensor<B, 2>,
) -> f32 {
    let diff_norm = (prediction.clone() - reference.clone())
        .powf_scalar(2.0)
        .sum()
        .sqrt();
    let ref_norm = reference.clone().powf_scalar(2.0).sum().sqrt();
    diff_norm.div(ref_norm).into_scalar().elem::<f32>()
}

/// 信号対雑音比をデシベルで返します。
pub fn calculate_snr(signal: &[f64], noise: &[f64]) -> f64 {
    let power = |values: &[f64]| {
        values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64
    };
    10.0 * (power(signal) / power(noise)).log10()
}

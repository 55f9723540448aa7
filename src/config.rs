//! 振り子系・データ生成・学習の設定。
//!
//! 参照実行の定数をそのまま既定値としますが、すべて名前付きフィールド
//! として上書き可能です。物理定数はグローバル変数ではなく、この不変の
//! 構造体として損失計算と参照解の生成に明示的に渡します。

use std::f64::consts::PI;

use crate::error::PinnError;

/// 振り子の物理系（不変）。
#[derive(Debug, Clone)]
pub struct PendulumSystem {
    /// 重力加速度 g (m/s^2)
    pub gravity: f64,
    /// 振り子の棒の長さ L (m)
    pub rod_length: f64,
    /// 初期角変位 θ0 (rad)
    pub theta0: f64,
    /// 初期角速度 ω0 (rad/s)
    pub omega0: f64,
}

impl Default for PendulumSystem {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            rod_length: 1.0,
            theta0: PI / 4.0,
            omega0: 0.0,
        }
    }
}

/// 参照軌道と観測データの生成条件。
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// シミュレーション終了時刻 (s)。区間は [0, t_end]。
    pub t_end: f64,
    /// サンプリング周波数 (Hz)
    pub sample_freq: usize,
    /// 観測ノイズの標準偏差 (rad)
    pub noise_std: f64,
    /// ダウンサンプリングの間引き係数
    pub resample: usize,
    /// 観測データを切り詰める時刻 (s)
    pub cut_time: f64,
    /// ノイズ生成の乱数シード
    pub noise_seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            t_end: 10.0,
            sample_freq: 100,
            noise_std: 0.05,
            resample: 5,
            cut_time: 2.5,
            noise_seed: 42,
        }
    }
}

/// 4項損失の固定重み。すべて既定値 1.0。
#[derive(Debug, Clone)]
pub struct LossWeights {
    /// λ1: 物理残差（ODE）項
    pub physics: f64,
    /// λ2: 初期条件項
    pub initial: f64,
    /// λ3: 初速度ゼロの境界条件項
    pub boundary: f64,
    /// λ4: データ適合項
    pub data: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            physics: 1.0,
            initial: 1.0,
            boundary: 1.0,
            data: 1.0,
        }
    }
}

/// 学習の設定。
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// 各層の幅。先頭と末尾は 1（スカラー入出力）。
    pub layer_widths: Vec<usize>,
    /// Adam の学習率
    pub learning_rate: f64,
    /// 反復回数（早期終了なしの固定予算）
    pub iterations: usize,
    /// 損失の重み
    pub weights: LossWeights,
    /// パラメータ初期化の乱数シード
    pub seed: u64,
    /// 進捗を表示する反復間隔
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            layer_widths: vec![1, 20, 20, 20, 1],
            learning_rate: 1e-3,
            iterations: 50_000,
            weights: LossWeights::default(),
            seed: 123,
            log_every: 1000,
        }
    }
}

impl TrainingConfig {
    /// 設定値を検証します。
    pub fn validate(&self) -> Result<(), PinnError> {
        validate_layer_widths(&self.layer_widths)?;
        if self.learning_rate <= 0.0 {
            return Err(PinnError::Config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.iterations == 0 {
            return Err(PinnError::Config("iteration budget must be non-zero".into()));
        }
        let w = &self.weights;
        for (name, value) in [
            ("physics", w.physics),
            ("initial", w.initial),
            ("boundary", w.boundary),
            ("data", w.data),
        ] {
            if value < 0.0 {
                return Err(PinnError::Config(format!(
                    "loss weight '{name}' must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// 層幅の列を検証します。スカラー入出力の全結合網であることが条件です。
pub fn validate_layer_widths(widths: &[usize]) -> Result<(), PinnError> {
    if widths.len() < 2 {
        return Err(PinnError::Config(format!(
            "layer widths need at least 2 entries, got {}",
            widths.len()
        )));
    }
    if widths.iter().any(|&w| w == 0) {
        return Err(PinnError::Config("layer widths must be positive".into()));
    }
    if widths[0] != 1 || widths[widths.len() - 1] != 1 {
        return Err(PinnError::Config(format!(
            "input and output widths must be 1, got {} and {}",
            widths[0],
            widths[widths.len() - 1]
        )));
    }
    Ok(())
}

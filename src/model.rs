use burn::backend::Autodiff;
use burn::module::{Module, Param};
use burn::nn::{Linear, Tanh};
use burn::prelude::Backend;
use burn::tensor::{Distribution, Tensor};

use crate::config::validate_layer_widths;
use crate::error::PinnError;

/// 振り子 PINN の本体となるニューラルネットワークモデル。
///
/// 時刻 t（N×1）を入力とし、その時点の角変位 θ(t)（N×1）を予測する
/// 多層パーセプトロン（MLP）です。最終層を除く各全結合層の後に
/// tanh を適用します。
///
/// 層構成（層数と各幅）は構築後に不変で、学習で変化するのは
/// パラメータの数値のみです。
#[derive(Module, Debug)]
pub struct PendulumNet<B: Backend> {
    linears: Vec<Linear<B>>,
    activation: Tanh,
}

impl<B: Backend> PendulumNet<B> {
    /// 層幅の列 `[w0, w1, ..., wk]`（w0 = wk = 1）から新しいモデルを初期化します。
    ///
    /// 全結合層は `widths.len() - 1` 個。重みは Xavier 正規分布
    /// N(0, sqrt(2/(fan_in+fan_out))) から抽出し、バイアスはゼロで初期化します。
    pub fn new(widths: &[usize], device: &B::Device) -> Result<Self, PinnError> {
        validate_layer_widths(widths)?;
        let mut linears = Vec::with_capacity(widths.len() - 1);
        for pair in widths.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let std = (2.0 / (fan_in + fan_out) as f64).sqrt();
            let weight =
                Tensor::random([fan_in, fan_out], Distribution::Normal(0.0, std), device);
            let bias = Tensor::zeros([fan_out], device);
            linears.push(Linear {
                weight: Param::from_tensor(weight),
                bias: Some(Param::from_tensor(bias)),
            });
        }
        Ok(Self {
            linears,
            activation: Tanh::new(),
        })
    }

    /// モデルの順伝播を実行します。
    ///
    /// 呼び出しごとに新しい計算グラフを構築し、同一パラメータに対しては
    /// 決定的に同じ出力を返します。
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = input;
        for i in 0..(self.linears.len() - 1) {
            x = self.linears[i].forward(x);
            x = self.activation.forward(x);
        }
        self.linears.last().unwrap().forward(x)
    }

    /// パラメータを `Autodiff` バックエンド1段上へ持ち上げたモデルを返します。
    ///
    /// 各パラメータは `Tensor::from_inner` で包み直すため、元のバックエンドの
    /// 計算グラフとの接続は保たれます。持ち上げたモデルで順伝播と逆伝播を
    /// 行うと、その計算自体が1段下のグラフに記録され、入力に関する微分が
    /// 元のパラメータに対して微分可能なまま得られます。
    pub fn lift(&self) -> PendulumNet<Autodiff<B>> {
        let linears = self
            .linears
            .iter()
            .map(|layer| Linear {
                weight: Param::from_tensor(Tensor::from_inner(layer.weight.val())),
                bias: layer
                    .bias
                    .as_ref()
                    .map(|b| Param::from_tensor(Tensor::from_inner(b.val()))),
            })
            .collect::<Vec<Linear<Autodiff<B>>>>();
        PendulumNet {
            linears,
            activation: Tanh::new(),
        }
    }
}

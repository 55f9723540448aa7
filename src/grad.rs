//! 合成可能な微分演算子。
//!
//! `partial(output, input)` はサンプルごとの導関数 d(output)/d(input) を
//! 返します。結果は1段内側のバックエンドのテンソルとして得られるため、
//! `Autodiff` を入れ子にしたバックエンド上では、返り値がそのまま内側の
//! 計算グラフに属し、もう一度 `partial` を適用して2階微分を取れます。
//! `torch.autograd.grad(..., create_graph=True)` に相当する構成です。

use burn::tensor::Tensor;
use burn::tensor::backend::AutodiffBackend;

use crate::error::PinnError;

/// `output`（N×1）の `input`（N×1）に関する要素ごとの導関数を返します。
///
/// `input` の勾配追跡が有効でない場合、または `output` が `input` から
/// 追跡された計算で得られたものでない場合はエラーになります。
pub fn partial<B: AutodiffBackend>(
    output: Tensor<B, 2>,
    input: &Tensor<B, 2>,
) -> Result<Tensor<B::InnerBackend, 2>, PinnError> {
    if !input.is_require_grad() {
        return Err(PinnError::GradientTracking(
            "input tensor is not configured for gradient tracking".into(),
        ));
    }
    // 出力は1サンプルにつき1スカラーなので、総和の勾配が
    // そのまま要素ごとの導関数になる
    let grads = output.sum().backward();
    input.grad(&grads).ok_or_else(|| {
        PinnError::GradientTracking("output was not computed from the given input".into())
    })
}

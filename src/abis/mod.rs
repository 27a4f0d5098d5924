pub mod algebra;
pub mod erc20;

pub use algebra::IAlgebraPool;
pub use erc20::IERC20;

// Sparsity pattern, dense operand checks and the reference oracle

pub mod config;
pub mod operands;
pub mod pattern;
pub mod reference;

pub use config::{BenchParams, KernelParams, SddmmConfig, SystemParameters, Tolerance};
pub use operands::{check_operands, check_output};
pub use pattern::SparsityPattern;
pub use reference::{reference_sddmm, reference_sddmm_into};

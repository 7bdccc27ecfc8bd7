//! Mila IR 代码生成器
//!
//! 本模块将 Mila AST 降低为 IR 模块，按职责拆分为多个子模块：
//! 上下文与作用域、类型转换、表达式、语句、内置函数和主入口。

pub mod context;
mod types;
mod expressions;
mod statements;
pub mod runtime;
mod generator;

// 公开 IRGenerator 作为代码生成器的入口
pub use context::IRGenerator;
pub use runtime::{BUILTINS, BuiltinKind};

use crate::ast::Program;
use crate::error::MilaResult;
use crate::ir::Module;

/// 以默认选项生成模块
pub fn generate(program: &Program) -> MilaResult<Module> {
    IRGenerator::new().generate(program)
}

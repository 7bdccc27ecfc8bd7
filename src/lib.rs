pub mod error;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod ir;
pub mod codegen;

use error::MilaResult;

/// 编译选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    /// 写入模块头部的 target triple
    pub target_triple: Option<String>,
    /// 模块名，默认使用 program 名
    pub module_name: Option<String>,
}

pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// 源码编译为 IR 模块；任何错误都不产生部分结果
    pub fn compile(&self, source: &str) -> MilaResult<ir::Module> {
        // 1. 词法 + 语法分析（令牌按需拉取）
        let program = parser::parse(source)?;

        // 2. 代码生成
        let generator = codegen::IRGenerator::with_options(&self.options);
        let module = generator.generate(&program)?;

        tracing::info!(
            module = %module.name,
            functions = module.functions.len(),
            "compilation finished"
        );
        Ok(module)
    }

    /// 编译并输出文本 IR
    pub fn compile_to_string(&self, source: &str) -> MilaResult<String> {
        Ok(self.compile(source)?.to_string())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

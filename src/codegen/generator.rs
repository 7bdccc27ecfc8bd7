//! Mila IR 代码生成器主模块
//!
//! 本模块将 Mila AST 转换为 IR 模块。

use crate::ast::{self, Program, ReturnType};
use crate::codegen::context::{Callee, CalleeKind, FunctionGenerator, IRGenerator, Symbol};
use crate::error::{MilaResult, semantic_error};
use crate::ir::{Function, FunctionBuilder, Module, Param, Type, Value};

impl IRGenerator {
    /// 主入口：生成程序的 IR 模块
    pub fn generate(mut self, program: &Program) -> MilaResult<Module> {
        self.module.name = self.module_name.clone().unwrap_or_else(|| program.name.clone());
        self.declare_builtins()?;

        for function in &program.functions {
            let index = self.declare_function(function)?;
            if let Some(body) = &function.body {
                // 先登记再生成函数体，递归调用可以解析
                if let Some(callee) = self.callees.get_mut(&function.signature.name) {
                    callee.defined = true;
                }
                let generated = self.generate_function(function, body)?;
                tracing::debug!(
                    function = %generated.name,
                    blocks = generated.blocks.len(),
                    "generated function"
                );
                self.module.functions[index] = generated;
            }
        }

        tracing::debug!(
            module = %self.module.name,
            functions = self.module.functions.len(),
            strings = self.module.globals.len(),
            "generated module"
        );
        Ok(self.module)
    }

    /// 登记函数签名；重复的前向声明复用同一位置
    fn declare_function(&mut self, function: &ast::Function) -> MilaResult<usize> {
        let signature = &function.signature;
        let name = &signature.name;

        for (i, param) in signature.params.iter().enumerate() {
            if signature.params[..i].contains(param) {
                return Err(semantic_error(format!(
                    "duplicate parameter '{}' in function '{}'",
                    param, name
                )));
            }
        }

        if let Some(callee) = self.callees.get(name) {
            if let CalleeKind::Builtin(_) = callee.kind {
                return Err(semantic_error(format!("function '{}' redefines a built-in", name)));
            }
            if callee.arity != signature.params.len() {
                return Err(semantic_error(format!(
                    "function '{}' declared with {} parameter(s), previously declared with {}",
                    name,
                    signature.params.len(),
                    callee.arity
                )));
            }
            if callee.defined && function.body.is_some() {
                return Err(semantic_error(format!("function '{}' is defined more than once", name)));
            }
            return Ok(callee.index);
        }

        let params = ir_params(signature);
        self.module
            .functions
            .push(Function::declaration(name.clone(), Type::i32(), params));
        let index = self.module.functions.len() - 1;
        self.callees.insert(
            name.clone(),
            Callee {
                name: name.clone(),
                kind: CalleeKind::User,
                arity: signature.params.len(),
                index,
                defined: false,
            },
        );
        Ok(index)
    }

    fn generate_function(&mut self, function: &ast::Function, body: &ast::Block) -> MilaResult<Function> {
        let signature = &function.signature;
        let builder = FunctionBuilder::new(signature.name.clone(), Type::i32(), ir_params(signature));
        let mut fg = FunctionGenerator::new(self, builder);

        // 返回值栈槽与函数同名
        if signature.return_type == ReturnType::Integer {
            let slot = fg.builder.alloca(&signature.name, Type::i32());
            fg.declare(&signature.name, Symbol::Slot(slot.clone()));
            fg.return_slot = Some(slot);
        }

        // 参数复制到各自的栈槽
        let params: Vec<Param> = fg.builder.params().to_vec();
        for (name, param) in signature.params.iter().zip(params) {
            let slot = fg.builder.alloca(name, Type::i32());
            let incoming = Value::Local { name: param.name, ty: param.ty };
            fg.builder.build_store(incoming, slot.clone())?;
            fg.declare(name, Symbol::Slot(slot));
        }

        fg.generate_block(body)?;

        if !fg.builder.is_terminated() {
            let value = match fg.return_slot.clone() {
                Some(slot) => fg.builder.build_load(slot)?,
                None => Value::i32(0),
            };
            fg.builder.build_ret(value)?;
        }

        Ok(fg.builder.finish())
    }
}

fn ir_params(signature: &ast::Signature) -> Vec<Param> {
    signature
        .params
        .iter()
        .map(|name| Param {
            name: format!("arg.{}", name),
            ty: Type::i32(),
        })
        .collect()
}

//! 表达式代码生成
use crate::ast::*;
use crate::codegen::context::{CalleeKind, FunctionGenerator, Symbol};
use crate::codegen::runtime::BuiltinKind;
use crate::error::{MilaResult, codegen_error, semantic_error};
use crate::ir::{BinOp, IntPredicate, Type, Value};

impl FunctionGenerator<'_> {
    /// 生成表达式代码
    pub fn generate_expression(&mut self, expr: &Expr) -> MilaResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(Value::i32(*value)),
            Expr::StringLiteral(text) => Err(semantic_error(format!(
                "string literal '{}' is only allowed as the argument of write",
                text
            ))),
            Expr::Variable(name) => self.generate_variable(name),
            Expr::Binary(bin) => self.generate_binary_expression(bin),
            Expr::Unary(unary) => self.generate_unary_expression(unary),
            Expr::Call(call) => self
                .generate_call(call, true)?
                .ok_or_else(|| codegen_error(format!("call to '{}' produced no value", call.callee))),
        }
    }

    fn generate_variable(&mut self, name: &str) -> MilaResult<Value> {
        match self.lookup(name).cloned() {
            Some(Symbol::Slot(slot)) => self.builder.build_load(slot),
            // 常量直接替换，不产生 load
            Some(Symbol::Constant(value)) => Ok(Value::i32(value)),
            None => Err(semantic_error(format!("undefined symbol '{}'", name))),
        }
    }

    /// 变量的栈槽指针
    pub fn variable_slot(&self, name: &str) -> MilaResult<Value> {
        match self.lookup(name) {
            Some(Symbol::Slot(slot)) => Ok(slot.clone()),
            Some(Symbol::Constant(_)) => Err(semantic_error(format!("'{}' is a constant, not a variable", name))),
            None => Err(semantic_error(format!("undefined symbol '{}'", name))),
        }
    }

    fn generate_binary_expression(&mut self, bin: &BinaryExpr) -> MilaResult<Value> {
        let lhs = self.generate_expression(&bin.left)?;
        let rhs = self.generate_expression(&bin.right)?;

        if let Some(pred) = comparison_predicate(bin.op) {
            let lhs = self.to_integer(lhs)?;
            let rhs = self.to_integer(rhs)?;
            return self.builder.build_icmp(pred, lhs, rhs);
        }

        let op = arithmetic_op(bin.op)
            .ok_or_else(|| codegen_error(format!("operator '{}' has no instruction", bin.op)))?;

        // 两个条件做逻辑运算时保持 i1，否则按位运算于 i32
        if matches!(op, BinOp::And | BinOp::Or) && lhs.ty().is_bool() && rhs.ty().is_bool() {
            return self.builder.build_binary(op, lhs, rhs);
        }
        let lhs = self.to_integer(lhs)?;
        let rhs = self.to_integer(rhs)?;
        self.builder.build_binary(op, lhs, rhs)
    }

    fn generate_unary_expression(&mut self, unary: &UnaryExpr) -> MilaResult<Value> {
        let operand = self.generate_expression(&unary.operand)?;
        match unary.op {
            UnaryOp::Plus => Ok(operand),
            UnaryOp::Minus => {
                let operand = self.to_integer(operand)?;
                self.builder.build_binary(BinOp::Sub, Value::i32(0), operand)
            }
        }
    }

    /// 生成函数调用；`want_result` 为 false 时作为语句调用
    pub fn generate_call(&mut self, call: &CallExpr, want_result: bool) -> MilaResult<Option<Value>> {
        let callee = self
            .generator
            .callees
            .get(&call.callee)
            .cloned()
            .ok_or_else(|| semantic_error(format!("undefined function '{}'", call.callee)))?;

        if call.args.len() != callee.arity {
            return Err(semantic_error(format!(
                "function '{}' expects {} argument(s), got {}",
                call.callee,
                callee.arity,
                call.args.len()
            )));
        }

        let args = match callee.kind {
            CalleeKind::Builtin(BuiltinKind::ByReference) => match &call.args[0] {
                Expr::Variable(name) => vec![self.variable_slot(name)?],
                other => {
                    return Err(semantic_error(format!(
                        "built-in '{}' requires a variable argument, got {}",
                        call.callee, other
                    )));
                }
            },
            CalleeKind::Builtin(BuiltinKind::StringArgument) => match &call.args[0] {
                Expr::StringLiteral(text) => {
                    let global = self.generator.get_or_create_string_constant(text);
                    vec![self.builder.build_array_start(global)?]
                }
                other => {
                    return Err(semantic_error(format!(
                        "built-in '{}' requires a string literal argument, got {}",
                        call.callee, other
                    )));
                }
            },
            CalleeKind::Builtin(BuiltinKind::ByValue) | CalleeKind::User => {
                let mut values = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    let value = self.generate_expression(arg)?;
                    values.push(self.to_integer(value)?);
                }
                values
            }
        };

        self.builder.build_call(&callee.name, Type::i32(), args, want_result)
    }
}

/// 比较运算对应的有符号谓词
fn comparison_predicate(op: BinaryOp) -> Option<IntPredicate> {
    match op {
        BinaryOp::Eq => Some(IntPredicate::Eq),
        BinaryOp::Ne => Some(IntPredicate::Ne),
        BinaryOp::Lt => Some(IntPredicate::Slt),
        BinaryOp::Le => Some(IntPredicate::Sle),
        BinaryOp::Gt => Some(IntPredicate::Sgt),
        BinaryOp::Ge => Some(IntPredicate::Sge),
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::And
        | BinaryOp::Or => None,
    }
}

/// 算术与逻辑运算对应的指令；div/mod 为有符号
fn arithmetic_op(op: BinaryOp) -> Option<BinOp> {
    match op {
        BinaryOp::Add => Some(BinOp::Add),
        BinaryOp::Sub => Some(BinOp::Sub),
        BinaryOp::Mul => Some(BinOp::Mul),
        BinaryOp::Div => Some(BinOp::SDiv),
        BinaryOp::Mod => Some(BinOp::SRem),
        BinaryOp::And => Some(BinOp::And),
        BinaryOp::Or => Some(BinOp::Or),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => None,
    }
}

//! 内置函数（运行时前导）
use crate::codegen::context::{Callee, CalleeKind, IRGenerator};
use crate::error::MilaResult;
use crate::ir::{BinOp, Function, FunctionBuilder, Param, Type, Value};

/// 内置函数的参数传递方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// 按值传递一个整数
    ByValue,
    /// 传递变量栈槽地址
    ByReference,
    /// 传递字符串常量首地址
    StringArgument,
}

impl BuiltinKind {
    pub fn param_type(self) -> Type {
        match self {
            BuiltinKind::ByValue => Type::i32(),
            BuiltinKind::ByReference => Type::i32().ptr_to(),
            BuiltinKind::StringArgument => Type::i8().ptr_to(),
        }
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
    /// 有值时在模块内定义：*x = *x op 1
    pub step: Option<BinOp>,
}

pub const BUILTINS: [Builtin; 5] = [
    Builtin { name: "writeln", kind: BuiltinKind::ByValue, step: None },
    Builtin { name: "write", kind: BuiltinKind::StringArgument, step: None },
    Builtin { name: "readln", kind: BuiltinKind::ByReference, step: None },
    Builtin { name: "inc", kind: BuiltinKind::ByReference, step: Some(BinOp::Add) },
    Builtin { name: "dec", kind: BuiltinKind::ByReference, step: Some(BinOp::Sub) },
];

impl IRGenerator {
    /// 发射内置函数声明与 inc/dec 的定义
    pub fn declare_builtins(&mut self) -> MilaResult<()> {
        for builtin in &BUILTINS {
            let param = Param {
                name: "arg.x".to_string(),
                ty: builtin.kind.param_type(),
            };
            let function = match builtin.step {
                Some(op) => step_function(builtin.name, param, op)?,
                None => Function::declaration(builtin.name.to_string(), Type::i32(), vec![param]),
            };
            self.module.functions.push(function);
            self.callees.insert(
                builtin.name.to_string(),
                Callee {
                    name: builtin.name.to_string(),
                    kind: CalleeKind::Builtin(builtin.kind),
                    arity: 1,
                    index: self.module.functions.len() - 1,
                    defined: true,
                },
            );
        }
        Ok(())
    }
}

fn step_function(name: &str, param: Param, op: BinOp) -> MilaResult<Function> {
    let ptr = Value::Local {
        name: param.name.clone(),
        ty: param.ty.clone(),
    };
    let mut builder = FunctionBuilder::new(name.to_string(), Type::i32(), vec![param]);
    let old = builder.build_load(ptr.clone())?;
    let new = builder.build_binary(op, old, Value::i32(1))?;
    builder.build_store(new, ptr)?;
    builder.build_ret(Value::i32(0))?;
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_order_and_signatures() {
        let mut generator = IRGenerator::new();
        generator.declare_builtins().unwrap();
        let names: Vec<&str> = generator.module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["writeln", "write", "readln", "inc", "dec"]);

        let write = generator.module.function("write").unwrap();
        assert!(write.is_declaration());
        assert_eq!(write.params[0].ty, Type::i8().ptr_to());

        let dec = generator.module.function("dec").unwrap();
        assert!(!dec.is_declaration());
        assert_eq!(dec.params[0].ty, Type::i32().ptr_to());
    }

    #[test]
    fn test_builtin_kinds() {
        let mut generator = IRGenerator::new();
        generator.declare_builtins().unwrap();
        assert_eq!(generator.callees["readln"].kind, CalleeKind::Builtin(BuiltinKind::ByReference));
        assert_eq!(generator.callees["writeln"].kind, CalleeKind::Builtin(BuiltinKind::ByValue));
    }
}

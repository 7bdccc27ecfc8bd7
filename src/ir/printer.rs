//! 文本 LLVM IR 输出

use super::*;
use std::fmt;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Int(bits) => write!(f, "i{}", bits),
            Type::Ptr(inner) => write!(f, "{}*", inner),
            Type::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
        }
    }
}

/// 只输出操作数本身，类型由指令负责
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt { value, .. } => write!(f, "{}", value),
            Value::Local { name, .. } => write!(f, "%{}", name),
            Value::Global { name, .. } => write!(f, "@{}", name),
        }
    }
}

/// 带类型的操作数：`i32 %x`
struct Typed<'a>(&'a Value);

impl fmt::Display for Typed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0.ty(), self.0)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::And => "and",
            BinOp::Or => "or",
        };
        f.write_str(s)
    }
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        };
        f.write_str(s)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Value]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", Typed(arg))?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { dest, ty } => write!(f, "%{} = alloca {}", dest, ty),
            Instruction::Load { dest, ty, ptr } => write!(f, "%{} = load {}, {}", dest, ty, Typed(ptr)),
            Instruction::Store { value, ptr } => write!(f, "store {}, {}", Typed(value), Typed(ptr)),
            Instruction::Binary { dest, op, lhs, rhs } => {
                write!(f, "%{} = {} {}, {}", dest, op, Typed(lhs), rhs)
            }
            Instruction::ICmp { dest, pred, lhs, rhs } => {
                write!(f, "%{} = icmp {} {}, {}", dest, pred, Typed(lhs), rhs)
            }
            Instruction::ZExt { dest, value, to } => write!(f, "%{} = zext {} to {}", dest, Typed(value), to),
            Instruction::Call { dest, return_type, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "%{} = ", dest)?;
                }
                write!(f, "call {} @{}(", return_type, callee)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Instruction::GetElementPtr { dest, source_ty, ptr, indices } => {
                write!(f, "%{} = getelementptr inbounds {}, {}", dest, source_ty, Typed(ptr))?;
                for index in indices {
                    write!(f, ", {}", Typed(index))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(value) => write!(f, "ret {}", Typed(value)),
            Terminator::Br(label) => write!(f, "br label %{}", label),
            Terminator::CondBr { cond, then_label, else_label } => {
                write!(f, "br {}, label %{}, label %{}", Typed(cond), then_label, else_label)
            }
            Terminator::Unreachable => f.write_str("unreachable"),
        }
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for inst in &self.instructions {
            writeln!(f, "  {}", inst)?;
        }
        match &self.terminator {
            Some(term) => writeln!(f, "  {}", term),
            None => writeln!(f, "  unreachable"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_declaration() {
            write!(f, "declare {} @{}(", self.return_type, self.name)?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", param.ty)?;
            }
            return writeln!(f, ")");
        }

        write!(f, "define {} @{}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} %{}", param.ty, param.name)?;
        }
        writeln!(f, ") {{")?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

/// 字节转义为 LLVM 字符数组字面量
fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (b.is_ascii_graphic() && b != b'"' && b != b'\\') || b == b' ' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} = private unnamed_addr constant {} c\"{}\", align 1",
            self.name,
            self.ty(),
            escape_bytes(&self.bytes)
        )
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "source_filename = \"{}\"", self.name)?;
        if let Some(triple) = &self.target_triple {
            writeln!(f, "target triple = \"{}\"", triple)?;
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                writeln!(f, "{}", global)?;
            }
        }

        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types() {
        assert_eq!(Type::i32().ptr_to().to_string(), "i32*");
        assert_eq!(Type::Array(6, Box::new(Type::i8())).to_string(), "[6 x i8]");
    }

    #[test]
    fn test_global_escaping() {
        let g = Global {
            name: ".str.0".to_string(),
            bytes: b"a \"b\"\n\0".to_vec(),
        };
        assert_eq!(
            g.to_string(),
            "@.str.0 = private unnamed_addr constant [7 x i8] c\"a \\22b\\22\\0A\\00\", align 1"
        );
    }

    #[test]
    fn test_function_printing() {
        let mut b = FunctionBuilder::new(
            "inc".to_string(),
            Type::i32(),
            vec![Param { name: "arg.x".to_string(), ty: Type::i32().ptr_to() }],
        );
        let ptr = Value::Local { name: "arg.x".to_string(), ty: Type::i32().ptr_to() };
        let old = b.build_load(ptr.clone()).unwrap();
        let new = b.build_binary(BinOp::Add, old, Value::i32(1)).unwrap();
        b.build_store(new, ptr).unwrap();
        b.build_ret(Value::i32(0)).unwrap();

        let expected = "define i32 @inc(i32* %arg.x) {\n\
                        entry:\n  \
                        %tmp.0 = load i32, i32* %arg.x\n  \
                        %tmp.1 = add i32 %tmp.0, 1\n  \
                        store i32 %tmp.1, i32* %arg.x\n  \
                        ret i32 0\n\
                        }\n";
        assert_eq!(b.finish().to_string(), expected);
    }

    #[test]
    fn test_declaration_printing() {
        let f = Function::declaration(
            "writeln".to_string(),
            Type::i32(),
            vec![Param { name: "x".to_string(), ty: Type::i32() }],
        );
        assert_eq!(f.to_string(), "declare i32 @writeln(i32)\n");
    }
}

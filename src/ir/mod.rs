//! 中间表示
//!
//! 带类型的 SSA 风格 IR，打印为文本 LLVM IR（类型化指针语法），
//! 交给下游原生后端处理。

pub mod builder;
pub mod printer;

pub use builder::{BlockId, FunctionBuilder};

/// IR 类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    /// 指定位宽的整数：i1 / i8 / i32
    Int(u32),
    Ptr(Box<Type>),
    Array(usize, Box<Type>),
}

impl Type {
    pub fn i1() -> Type {
        Type::Int(1)
    }

    pub fn i8() -> Type {
        Type::Int(8)
    }

    pub fn i32() -> Type {
        Type::Int(32)
    }

    pub fn ptr_to(self) -> Type {
        Type::Ptr(Box::new(self))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        *self == Type::Int(1)
    }
}

/// IR 值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 整数常量
    ConstInt { ty: Type, value: i64 },
    /// 局部寄存器、栈槽或参数（%name）
    Local { name: String, ty: Type },
    /// 全局符号（@name）
    Global { name: String, ty: Type },
}

impl Value {
    /// 32 位整数常量，超出范围的字面量按 32 位截断
    pub fn i32(value: i64) -> Value {
        Value::ConstInt {
            ty: Type::i32(),
            value: i64::from(value as i32),
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            Value::ConstInt { ty, .. } | Value::Local { ty, .. } | Value::Global { ty, .. } => ty,
        }
    }

    pub fn as_const_int(&self) -> Option<i64> {
        match self {
            Value::ConstInt { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// IR 指令
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca { dest: String, ty: Type },
    Load { dest: String, ty: Type, ptr: Value },
    Store { value: Value, ptr: Value },
    Binary { dest: String, op: BinOp, lhs: Value, rhs: Value },
    ICmp { dest: String, pred: IntPredicate, lhs: Value, rhs: Value },
    ZExt { dest: String, value: Value, to: Type },
    Call { dest: Option<String>, return_type: Type, callee: String, args: Vec<Value> },
    GetElementPtr { dest: String, source_ty: Type, ptr: Value, indices: Vec<Value> },
}

impl Instruction {
    pub fn dest(&self) -> Option<&str> {
        match self {
            Instruction::Alloca { dest, .. }
            | Instruction::Load { dest, .. }
            | Instruction::Binary { dest, .. }
            | Instruction::ICmp { dest, .. }
            | Instruction::ZExt { dest, .. }
            | Instruction::GetElementPtr { dest, .. } => Some(dest),
            Instruction::Call { dest, .. } => dest.as_deref(),
            Instruction::Store { .. } => None,
        }
    }
}

/// 基本块终结指令
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Ret(Value),
    Br(String),
    CondBr { cond: Value, then_label: String, else_label: String },
    /// 仅用于封闭生成结束时仍未终结的块
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(label: String) -> Self {
        Self {
            label,
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    /// 没有基本块的函数是外部声明
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn declaration(name: String, return_type: Type, params: Vec<Param>) -> Self {
        Self {
            name,
            return_type,
            params,
            blocks: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }
}

/// 私有常量字符数组（字符串字面量）
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    /// 含结尾 NUL 的字节
    pub bytes: Vec<u8>,
}

impl Global {
    pub fn ty(&self) -> Type {
        Type::Array(self.bytes.len(), Box::new(Type::i8()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub target_triple: Option<String>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: String) -> Self {
        Self {
            name,
            target_triple: None,
            globals: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

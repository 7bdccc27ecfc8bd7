//! 值类型转换（i1 与 i32 之间）
use crate::codegen::context::FunctionGenerator;
use crate::error::MilaResult;
use crate::ir::{IntPredicate, Type, Value};

impl FunctionGenerator<'_> {
    /// 需要整数的位置：比较结果零扩展为 i32
    pub fn to_integer(&mut self, value: Value) -> MilaResult<Value> {
        if value.ty().is_bool() {
            self.builder.build_zext(value, Type::i32())
        } else {
            Ok(value)
        }
    }

    /// 需要条件的位置：整数与 0 比较
    pub fn to_condition(&mut self, value: Value) -> MilaResult<Value> {
        if value.ty().is_bool() {
            Ok(value)
        } else {
            self.builder.build_icmp(IntPredicate::Ne, value, Value::i32(0))
        }
    }
}

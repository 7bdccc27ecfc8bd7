//! 函数级 IR 构建器
//!
//! 基本块只能追加；一旦终结就不再接受指令。
//! 所有 alloca 都放在入口块的开头。

use super::*;
use crate::error::{MilaResult, codegen_error};

pub type BlockId = usize;

pub struct FunctionBuilder {
    function: Function,
    current: BlockId,
    alloca_count: usize,
    temp_counter: usize,
    label_counter: usize,
}

impl FunctionBuilder {
    /// 创建函数并建立 entry 块
    pub fn new(name: String, return_type: Type, params: Vec<Param>) -> Self {
        let mut function = Function::declaration(name, return_type, params);
        function.blocks.push(BasicBlock::new("entry".to_string()));
        Self {
            function,
            current: 0,
            alloca_count: 0,
            temp_counter: 0,
            label_counter: 0,
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.function.params
    }

    /// 创建新块，标签按创建顺序编号
    pub fn create_block(&mut self, prefix: &str) -> BlockId {
        let label = format!("{}.{}", prefix, self.label_counter);
        self.label_counter += 1;
        tracing::trace!(function = %self.function.name, %label, "create block");
        self.function.blocks.push(BasicBlock::new(label));
        self.function.blocks.len() - 1
    }

    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    pub fn label(&self, block: BlockId) -> String {
        self.function.blocks[block].label.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.function.blocks[self.current].terminator.is_some()
    }

    pub fn new_temp(&mut self) -> String {
        let temp = format!("tmp.{}", self.temp_counter);
        self.temp_counter += 1;
        temp
    }

    pub fn push(&mut self, inst: Instruction) -> MilaResult<()> {
        let block = &mut self.function.blocks[self.current];
        if block.terminator.is_some() {
            return Err(codegen_error(format!(
                "instruction appended to terminated block '{}'",
                block.label
            )));
        }
        block.instructions.push(inst);
        Ok(())
    }

    pub fn terminate(&mut self, term: Terminator) -> MilaResult<()> {
        let block = &mut self.function.blocks[self.current];
        if block.terminator.is_some() {
            return Err(codegen_error(format!("block '{}' terminated twice", block.label)));
        }
        block.terminator = Some(term);
        Ok(())
    }

    /// 在入口块分配栈槽，返回指向它的指针
    pub fn alloca(&mut self, hint: &str, ty: Type) -> Value {
        let dest = format!("{}.addr.{}", hint, self.temp_counter);
        self.temp_counter += 1;
        let entry = &mut self.function.blocks[0];
        entry.instructions.insert(self.alloca_count, Instruction::Alloca { dest: dest.clone(), ty: ty.clone() });
        self.alloca_count += 1;
        Value::Local { name: dest, ty: ty.ptr_to() }
    }

    pub fn build_load(&mut self, ptr: Value) -> MilaResult<Value> {
        let ty = ptr
            .ty()
            .pointee()
            .cloned()
            .ok_or_else(|| codegen_error(format!("load from non-pointer value {}", ptr)))?;
        let dest = self.new_temp();
        self.push(Instruction::Load { dest: dest.clone(), ty: ty.clone(), ptr })?;
        Ok(Value::Local { name: dest, ty })
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) -> MilaResult<()> {
        self.push(Instruction::Store { value, ptr })
    }

    pub fn build_binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> MilaResult<Value> {
        let ty = lhs.ty().clone();
        let dest = self.new_temp();
        self.push(Instruction::Binary { dest: dest.clone(), op, lhs, rhs })?;
        Ok(Value::Local { name: dest, ty })
    }

    pub fn build_icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> MilaResult<Value> {
        let dest = self.new_temp();
        self.push(Instruction::ICmp { dest: dest.clone(), pred, lhs, rhs })?;
        Ok(Value::Local { name: dest, ty: Type::i1() })
    }

    pub fn build_zext(&mut self, value: Value, to: Type) -> MilaResult<Value> {
        let dest = self.new_temp();
        self.push(Instruction::ZExt { dest: dest.clone(), value, to: to.clone() })?;
        Ok(Value::Local { name: dest, ty: to })
    }

    /// 调用函数；`want_result` 为 false 时不命名返回值
    pub fn build_call(&mut self, callee: &str, return_type: Type, args: Vec<Value>, want_result: bool) -> MilaResult<Option<Value>> {
        let dest = want_result.then(|| self.new_temp());
        self.push(Instruction::Call {
            dest: dest.clone(),
            return_type: return_type.clone(),
            callee: callee.to_string(),
            args,
        })?;
        Ok(dest.map(|name| Value::Local { name, ty: return_type }))
    }

    /// 取数组首元素地址
    pub fn build_array_start(&mut self, array: Value) -> MilaResult<Value> {
        let (source_ty, elem) = match array.ty().pointee() {
            Some(Type::Array(len, elem)) => (Type::Array(*len, elem.clone()), (**elem).clone()),
            _ => return Err(codegen_error(format!("getelementptr on non-array pointer {}", array))),
        };
        let dest = self.new_temp();
        self.push(Instruction::GetElementPtr {
            dest: dest.clone(),
            source_ty,
            ptr: array,
            indices: vec![Value::i32(0), Value::i32(0)],
        })?;
        Ok(Value::Local { name: dest, ty: elem.ptr_to() })
    }

    pub fn build_br(&mut self, target: BlockId) -> MilaResult<()> {
        let label = self.label(target);
        self.terminate(Terminator::Br(label))
    }

    pub fn build_cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) -> MilaResult<()> {
        let then_label = self.label(then_block);
        let else_label = self.label(else_block);
        self.terminate(Terminator::CondBr { cond, then_label, else_label })
    }

    pub fn build_ret(&mut self, value: Value) -> MilaResult<()> {
        self.terminate(Terminator::Ret(value))
    }

    /// 完成构建；仍然开放的块以 unreachable 封闭
    pub fn finish(mut self) -> Function {
        for block in &mut self.function.blocks {
            if block.terminator.is_none() {
                block.terminator = Some(Terminator::Unreachable);
            }
        }
        self.function
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> FunctionBuilder {
        FunctionBuilder::new("f".to_string(), Type::i32(), Vec::new())
    }

    #[test]
    fn test_allocas_stay_in_entry_prefix() {
        let mut b = builder();
        let x = b.alloca("x", Type::i32());
        b.build_store(Value::i32(1), x.clone()).unwrap();
        let body = b.create_block("then");
        b.build_br(body).unwrap();
        b.switch_to(body);
        let y = b.alloca("y", Type::i32());
        b.build_store(Value::i32(2), y).unwrap();
        b.build_ret(Value::i32(0)).unwrap();

        let f = b.finish();
        let entry = &f.blocks[0].instructions;
        assert!(matches!(entry[0], Instruction::Alloca { .. }));
        assert!(matches!(entry[1], Instruction::Alloca { .. }));
        assert!(matches!(entry[2], Instruction::Store { .. }));
        assert_eq!(f.blocks[1].instructions.len(), 1);
    }

    #[test]
    fn test_terminated_block_rejects_instructions() {
        let mut b = builder();
        b.build_ret(Value::i32(0)).unwrap();
        assert!(b.is_terminated());
        assert!(b.build_binary(BinOp::Add, Value::i32(1), Value::i32(2)).is_err());
        assert!(b.build_ret(Value::i32(1)).is_err());
    }

    #[test]
    fn test_labels_follow_creation_order() {
        let mut b = builder();
        let a = b.create_block("then");
        let c = b.create_block("else");
        let d = b.create_block("cont");
        assert_eq!(b.label(a), "then.0");
        assert_eq!(b.label(c), "else.1");
        assert_eq!(b.label(d), "cont.2");
    }

    #[test]
    fn test_finish_closes_open_blocks() {
        let mut b = builder();
        b.create_block("dead");
        b.build_ret(Value::i32(0)).unwrap();
        let f = b.finish();
        assert_eq!(f.blocks[1].terminator, Some(Terminator::Unreachable));
    }

    #[test]
    fn test_load_requires_pointer() {
        let mut b = builder();
        assert!(b.build_load(Value::i32(3)).is_err());
    }
}

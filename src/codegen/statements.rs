//! 语句代码生成（包含所有控制流结构）
use crate::ast::*;
use crate::codegen::context::{FunctionGenerator, Symbol};
use crate::error::{MilaResult, semantic_error};
use crate::ir::{Type, Value};

impl FunctionGenerator<'_> {
    /// 生成语句块代码
    ///
    /// 块内声明只在块内可见；块结束后名字解析回到外层作用域，
    /// 但代码继续在块最后所在的基本块中生成。
    pub fn generate_block(&mut self, block: &Block) -> MilaResult<()> {
        let outer = self.current;
        let scope = self.scopes.child_scope(outer);
        self.current = scope;

        for stmt in &block.statements {
            // 终结之后的语句不可达
            if self.builder.is_terminated() {
                break;
            }
            self.generate_statement(stmt)?;
        }

        if self.current == scope {
            self.current = outer;
        } else {
            let block = self.builder.current_block();
            self.current = self.scopes.child_context(outer, block);
        }
        Ok(())
    }

    /// 生成单个语句代码
    pub fn generate_statement(&mut self, stmt: &Stmt) -> MilaResult<()> {
        match stmt {
            Stmt::Block(block) => self.generate_block(block),
            Stmt::Assign(assign) => self.generate_assignment(assign),
            Stmt::If(if_stmt) => self.generate_if_statement(if_stmt),
            Stmt::While(while_stmt) => self.generate_while_statement(while_stmt),
            Stmt::Break => self.generate_break(),
            Stmt::Exit => self.generate_exit(),
            Stmt::Call(call) => self.generate_call(call, false).map(|_| ()),
            Stmt::VarDecl(name) => {
                let slot = self.builder.alloca(name, Type::i32());
                self.declare(name, Symbol::Slot(slot));
                Ok(())
            }
            Stmt::ConstDecl { name, value } => {
                self.declare(name, Symbol::Constant(*value));
                Ok(())
            }
        }
    }

    fn generate_assignment(&mut self, assign: &Assignment) -> MilaResult<()> {
        let slot = match self.lookup(&assign.target).cloned() {
            Some(Symbol::Slot(slot)) => slot,
            Some(Symbol::Constant(_)) => {
                return Err(semantic_error(format!("cannot assign to constant '{}'", assign.target)));
            }
            None => {
                return Err(semantic_error(format!(
                    "undefined symbol '{}' in assignment",
                    assign.target
                )));
            }
        };
        let value = self.generate_expression(&assign.value)?;
        let value = self.to_integer(value)?;
        self.builder.build_store(value, slot)
    }

    /// if 语句：then / else / cont 三个块，按此顺序创建
    fn generate_if_statement(&mut self, if_stmt: &IfStmt) -> MilaResult<()> {
        let cond = self.generate_expression(&if_stmt.condition)?;
        let cond = self.to_condition(cond)?;

        let outer = self.current;
        let then_ctx = self.scopes.child_context(outer, self.builder.create_block("then"));
        let else_ctx = match if_stmt.else_branch {
            Some(_) => Some(self.scopes.child_context(outer, self.builder.create_block("else"))),
            None => None,
        };
        let cont_ctx = self.scopes.child_context(outer, self.builder.create_block("cont"));

        let then_block = self.scopes.get(then_ctx).block;
        let cont_block = self.scopes.get(cont_ctx).block;
        let false_block = else_ctx.map_or(cont_block, |ctx| self.scopes.get(ctx).block);
        self.builder.build_cond_br(cond, then_block, false_block)?;

        self.enter(then_ctx);
        self.generate_statement(&if_stmt.then_branch)?;
        if !self.builder.is_terminated() {
            self.builder.build_br(cont_block)?;
        }

        if let (Some(else_ctx), Some(else_branch)) = (else_ctx, &if_stmt.else_branch) {
            self.enter(else_ctx);
            self.generate_statement(else_branch)?;
            if !self.builder.is_terminated() {
                self.builder.build_br(cont_block)?;
            }
        }

        self.enter(cont_ctx);
        Ok(())
    }

    /// while 语句：入口判断一次，循环体末尾再判断一次
    fn generate_while_statement(&mut self, while_stmt: &WhileStmt) -> MilaResult<()> {
        let cond = self.generate_expression(&while_stmt.condition)?;
        let cond = self.to_condition(cond)?;

        let outer = self.current;
        let loop_ctx = self.scopes.child_context(outer, self.builder.create_block("loop"));
        let cont_ctx = self.scopes.child_context(outer, self.builder.create_block("cont"));
        let loop_block = self.scopes.get(loop_ctx).block;
        let cont_block = self.scopes.get(cont_ctx).block;
        self.scopes.get_mut(loop_ctx).break_target = Some(cont_block);

        self.builder.build_cond_br(cond, loop_block, cont_block)?;

        self.enter(loop_ctx);
        self.generate_statement(&while_stmt.body)?;
        if !self.builder.is_terminated() {
            let cond = self.generate_expression(&while_stmt.condition)?;
            let cond = self.to_condition(cond)?;
            self.builder.build_cond_br(cond, loop_block, cont_block)?;
        }

        self.enter(cont_ctx);
        Ok(())
    }

    /// 循环外的 break 不生成任何代码
    fn generate_break(&mut self) -> MilaResult<()> {
        match self.scopes.get(self.current).break_target {
            Some(target) => self.builder.build_br(target),
            None => {
                tracing::trace!(block = %self.builder.label(self.builder.current_block()), "break outside of a loop ignored");
                Ok(())
            }
        }
    }

    fn generate_exit(&mut self) -> MilaResult<()> {
        let value = match self.return_slot.clone() {
            Some(slot) => self.builder.build_load(slot)?,
            None => Value::i32(0),
        };
        self.builder.build_ret(value)
    }
}

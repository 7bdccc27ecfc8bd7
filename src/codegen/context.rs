//! IR生成上下文和状态管理
use std::collections::HashMap;

use crate::codegen::runtime::BuiltinKind;
use crate::ir::{BlockId, FunctionBuilder, Global, Module, Type, Value};

pub type ScopeId = usize;

/// 作用域中名字的绑定
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// 栈槽指针
    Slot(Value),
    /// 常量，在使用处直接替换
    Constant(i64),
}

/// 词法作用域记录
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// 该作用域生成代码所在的基本块
    pub block: BlockId,
    /// 最近外层循环的 continuation 块
    pub break_target: Option<BlockId>,
    pub symbols: HashMap<String, Symbol>,
}

/// 作用域竞技场，父作用域用下标表示
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        self.scopes.len() - 1
    }

    /// 函数级作用域
    pub fn root(&mut self, block: BlockId) -> ScopeId {
        self.push(Scope {
            parent: None,
            block,
            break_target: None,
            symbols: HashMap::new(),
        })
    }

    /// 嵌套语句块：同一个基本块，新的名字层
    pub fn child_scope(&mut self, parent: ScopeId) -> ScopeId {
        let block = self.scopes[parent].block;
        self.child_context(parent, block)
    }

    /// 控制结构的新基本块，继承 break 目标
    pub fn child_context(&mut self, parent: ScopeId, block: BlockId) -> ScopeId {
        let break_target = self.scopes[parent].break_target;
        self.push(Scope {
            parent: Some(parent),
            block,
            break_target,
            symbols: HashMap::new(),
        })
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn declare(&mut self, id: ScopeId, name: &str, symbol: Symbol) {
        self.scopes[id].symbols.insert(name.to_string(), symbol);
    }

    /// 从内层到外层查找
    pub fn lookup(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let scope = &self.scopes[current];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            cursor = scope.parent;
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalleeKind {
    User,
    Builtin(BuiltinKind),
}

/// 函数表条目
#[derive(Debug, Clone)]
pub struct Callee {
    pub name: String,
    pub kind: CalleeKind,
    pub arity: usize,
    /// 在 module.functions 中的位置
    pub index: usize,
    /// 已生成函数体（forward 声明为 false）
    pub defined: bool,
}

/// IR生成器核心上下文
pub struct IRGenerator {
    pub module: Module,
    pub callees: HashMap<String, Callee>,
    pub global_strings: HashMap<String, String>,
    pub module_name: Option<String>,
}

impl IRGenerator {
    pub fn new() -> Self {
        Self::with_options(&crate::CompilerOptions::default())
    }

    pub fn with_options(options: &crate::CompilerOptions) -> Self {
        let mut module = Module::new(String::new());
        module.target_triple = options.target_triple.clone();
        Self {
            module,
            callees: HashMap::new(),
            global_strings: HashMap::new(),
            module_name: options.module_name.clone(),
        }
    }

    /// 获取或创建字符串常量，返回指向字符数组的全局值
    pub fn get_or_create_string_constant(&mut self, s: &str) -> Value {
        let len = s.len() + 1;
        let ty = Type::Array(len, Box::new(Type::i8())).ptr_to();
        if let Some(name) = self.global_strings.get(s) {
            return Value::Global { name: name.clone(), ty };
        }

        let name = format!(".str.{}", self.module.globals.len());
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.module.globals.push(Global { name: name.clone(), bytes });
        self.global_strings.insert(s.to_string(), name.clone());
        Value::Global { name, ty }
    }
}

impl Default for IRGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个函数的生成状态
pub struct FunctionGenerator<'g> {
    pub generator: &'g mut IRGenerator,
    pub builder: FunctionBuilder,
    pub scopes: ScopeArena,
    pub current: ScopeId,
    /// 有返回值的函数以自身名字命名的返回值栈槽
    pub return_slot: Option<Value>,
}

impl<'g> FunctionGenerator<'g> {
    pub fn new(generator: &'g mut IRGenerator, builder: FunctionBuilder) -> Self {
        let mut scopes = ScopeArena::new();
        let current = scopes.root(builder.current_block());
        Self {
            generator,
            builder,
            scopes,
            current,
            return_slot: None,
        }
    }

    /// 切换到另一个上下文及其基本块
    pub fn enter(&mut self, scope: ScopeId) {
        self.current = scope;
        self.builder.switch_to(self.scopes.get(scope).block);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(self.current, name)
    }

    pub fn declare(&mut self, name: &str, symbol: Symbol) {
        self.scopes.declare(self.current, name, symbol);
    }
}

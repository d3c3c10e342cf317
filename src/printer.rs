//! Debug renderer for recorded programs.
//!
//! Prints the IR tree as indented text with temps spelled `t<n>` and stack
//! slots `@<n>`. The output is meant for humans and golden tests, not for
//! parsing.

use crate::ir::func::{Function, Program};
use crate::ir::stat::{Block, Statement};
use crate::ir::types::{Type, TypeRef};
use crate::ir::value::{BasicValue, Value};

#[derive(Debug)]
pub struct IrPrinter {
    indent: String,
    depth: usize,
    out: String,
}

impl Default for IrPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl IrPrinter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indent: "    ".to_owned(),
            depth: 0,
            out: String::new(),
        }
    }

    /// Replace the per-level indent string.
    pub fn set_indent(&mut self, indent: impl Into<String>) {
        self.indent = indent.into();
    }

    pub fn print(&mut self, program: &Program) {
        for ty in &program.structs {
            self.print_struct(*ty);
        }
        for function in &program.functions {
            self.print_function(function);
        }
    }

    #[must_use]
    pub fn result(&self) -> &str {
        &self.out
    }

    #[must_use]
    pub fn into_result(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(&self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn print_struct(&mut self, ty: TypeRef) {
        let Type::Struct { name, fields } = &*ty else {
            return;
        };
        self.line(&format!("struct {name} {{"));
        self.depth += 1;
        for (field, field_ty) in fields {
            self.line(&format!("{field}: {}", type_name(*field_ty)));
        }
        self.depth -= 1;
        self.line("}");
    }

    fn print_function(&mut self, function: &Function) {
        self.line(&format!("{} fn {} {{", function.ty, function.name));
        self.depth += 1;
        for alloc in function.allocations.values() {
            let arg = if function.args.contains(&alloc.index) {
                " (arg)"
            } else {
                ""
            };
            self.line(&format!("@{}: {}{arg}", alloc.index, type_name(alloc.ty)));
        }
        self.print_block_body(&function.body);
        self.depth -= 1;
        self.line("}");
    }

    fn print_block_body(&mut self, block: &Block) {
        for stat in &block.stats {
            self.print_statement(stat);
        }
    }

    fn print_statement(&mut self, stat: &Statement) {
        match stat {
            Statement::Store { dst, src } => {
                self.line(&format!("store {}, {}", operand(dst), operand(src)));
            }
            Statement::Assign { lhs, rhs } => {
                self.line(&format!("t{} = {}", lhs.id, value(rhs)));
            }
            Statement::Break => self.line("break"),
            Statement::Continue => self.line("continue"),
            Statement::Block(block) => {
                self.line("{");
                self.depth += 1;
                self.print_block_body(block);
                self.depth -= 1;
                self.line("}");
            }
            Statement::If(if_stat) => {
                for (n, arm) in if_stat.arms.iter().enumerate() {
                    let keyword = if n == 0 { "if" } else { "} elif" };
                    self.line(&format!("{keyword} {} {{", operand(&arm.cond)));
                    self.depth += 1;
                    self.print_block_body(&arm.block);
                    self.depth -= 1;
                }
                if let Some(else_block) = &if_stat.else_block {
                    self.line("} else {");
                    self.depth += 1;
                    self.print_block_body(else_block);
                    self.depth -= 1;
                }
                self.line("}");
            }
            Statement::While(while_stat) => {
                self.line("while {");
                self.depth += 1;
                self.print_block_body(&while_stat.cond_block);
                self.line(&format!("test {}", operand(&while_stat.cond)));
                self.depth -= 1;
                self.line("} do {");
                self.depth += 1;
                self.print_block_body(&while_stat.body);
                self.depth -= 1;
                self.line("}");
            }
        }
    }
}

fn operand(value: &BasicValue) -> String {
    match value {
        BasicValue::Temp(t) => format!("t{}", t.id),
        BasicValue::Immediate(imm) => format!("{imm}:{}", imm.kind()),
        BasicValue::AllocAddr(index) => format!("@{index}"),
    }
}

fn value(value: &Value) -> String {
    match value {
        Value::Basic(v) => operand(v),
        Value::Load { ty, addr } => format!("load {}, {}", type_name(*ty), operand(addr)),
        Value::Binary { op, lhs, rhs, ty } => {
            format!("{op}.{} {}, {}", type_name(*ty), operand(lhs), operand(rhs))
        }
        Value::Unary { op, operand: v, ty } => {
            format!("{op}.{} {}", type_name(*ty), operand(v))
        }
        Value::Cast { from, to, operand: v } => {
            format!("cast {} -> {}, {}", type_name(*from), type_name(*to), operand(v))
        }
        Value::PointerOffset { pointee, base, index } => {
            format!(
                "ptroff {}, {}, {}",
                type_name(*pointee),
                operand(base),
                operand(index)
            )
        }
        Value::MemberPtr { object, base, member } => {
            format!("memberptr {}, {}, #{member}", type_name(*object), operand(base))
        }
        Value::Call { name, args, ret } => {
            let args: Vec<String> = args.iter().map(operand).collect();
            format!("call {}, {name}({})", type_name(*ret), args.join(", "))
        }
    }
}

fn type_name(ty: TypeRef) -> String {
    match &*ty {
        Type::Builtin(kind) => kind.to_string(),
        Type::Array { element, length } => format!("{}[{length}]", type_name(*element)),
        Type::Pointer { pointee } => format!("{}*", type_name(*pointee)),
        Type::Struct { name, .. } => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::BuiltinType;

    #[test]
    fn test_type_names() {
        let f32_ty = Type::builtin(BuiltinType::F32);
        assert_eq!(type_name(f32_ty), "f32");
        assert_eq!(type_name(Type::pointer(f32_ty)), "f32*");
        assert_eq!(type_name(Type::array(f32_ty, 8)), "f32[8]");

        let vec2 = Type::structure(
            "vec2",
            vec![("x".into(), f32_ty), ("y".into(), f32_ty)],
        );
        assert_eq!(type_name(Type::pointer(vec2)), "vec2*");
    }

    #[test]
    fn test_operand_rendering() {
        use crate::ir::value::Immediate;

        assert_eq!(operand(&BasicValue::AllocAddr(2)), "@2");
        assert_eq!(
            operand(&BasicValue::Immediate(Immediate::I32(10))),
            "10:i32"
        );
    }
}

//! Python emitter: [`Module`] → `TypedDict` / `Literal` / `Enum` source.
//!
//! Rendering is all-or-nothing per module: a declaration that cannot be
//! spelled in Python fails the whole `emit` call and leaves the buffer
//! untouched.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SchemaError};
use crate::ir::{Declaration, EnumDecl, Field, RecordDecl, Ty};
use crate::module::{ImportRole, Module};
use crate::schema::{Kind, Literal};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const INDENT: &str = "    ";

fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !KEYWORDS.contains(&name)
}

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

/// How enumeration declarations are spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EnumStyle {
    /// `Name = Literal['a', 'b']`
    #[default]
    Literal,
    /// `class Name(Enum):` with one member per value
    Class,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodegenOptions {
    pub enum_style: EnumStyle,
}

// ————————————————————————————————————————————————————————————————————————————
// EMITTER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct Codegen {
    options: CodegenOptions,
    out: String,
}

impl Codegen {
    pub fn new(options: CodegenOptions) -> Self {
        Self { options, out: String::new() }
    }

    pub fn emit(&mut self, module: &Module) -> Result<()> {
        let mut src = render_imports(module.imports);
        for declaration in &module.declarations {
            src.push_str("\n\n");
            match declaration {
                Declaration::Record(record) => src.push_str(&render_record(record)?),
                Declaration::Enum(enumeration) => {
                    src.push_str(&render_enum(enumeration, self.options.enum_style)?)
                }
            }
        }
        self.out.push_str(&src);
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

// ---- imports ---- //

fn import_of(role: ImportRole) -> (&'static str, &'static str) {
    match role {
        ImportRole::DeferredAnnotations => ("__future__", "annotations"),
        ImportRole::EnumBase => ("enum", "Enum"),
        ImportRole::LiteralSet => ("typing", "Literal"),
        ImportRole::TaggedUnion => ("typing", "Union"),
        ImportRole::OptionalField => ("typing_extensions", "NotRequired"),
        ImportRole::RecordBase => ("typing_extensions", "TypedDict"),
    }
}

fn render_imports(roles: &[ImportRole]) -> String {
    let mut grouped = IndexMap::<&str, Vec<&str>>::new();
    for role in roles {
        let (module, name) = import_of(*role);
        let names = grouped.entry(module).or_default();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    grouped
        .into_iter()
        .map(|(module, names)| format!("from {module} import {}\n", names.join(", ")))
        .collect()
}

// ---- records ---- //

fn render_record(record: &RecordDecl) -> Result<String> {
    check_name(&record.name, "declaration name")?;
    for base in &record.bases {
        check_name(base, "base type")?;
    }
    if record.fields.iter().all(|f| is_identifier(&f.name)) {
        return render_record_class(record);
    }
    if !record.bases.is_empty() {
        return Err(SchemaError::UnrepresentableName {
            name: record.name.clone(),
            reason: "functional TypedDict syntax cannot inherit; a field name is not a Python identifier"
                .into(),
        });
    }
    render_record_functional(record)
}

fn render_record_class(record: &RecordDecl) -> Result<String> {
    let bases = if record.bases.is_empty() {
        "TypedDict".to_owned()
    } else {
        record.bases.join(", ")
    };
    let mut src = format!("class {}({bases}):\n", record.name);
    if record.fields.is_empty() {
        src.push_str(&format!("{INDENT}pass\n"));
    }
    for field in &record.fields {
        src.push_str(&format!("{INDENT}{}: {}\n", field.name, render_field_type(field, Names::Bare)?));
    }
    Ok(src)
}

fn render_record_functional(record: &RecordDecl) -> Result<String> {
    let name = &record.name;
    let mut src = format!("{name} = TypedDict({}, {{\n", python_str(name));
    for field in &record.fields {
        src.push_str(&format!(
            "{INDENT}{}: {},\n",
            python_str(&field.name),
            render_field_type(field, Names::Quoted)?
        ));
    }
    src.push_str("}, total=True)\n");
    Ok(src)
}

fn render_field_type(field: &Field, names: Names) -> Result<String> {
    let ty = render_ty(&field.ty, names)?;
    Ok(if field.required { ty } else { format!("NotRequired[{ty}]") })
}

// ---- enums ---- //

fn render_enum(enumeration: &EnumDecl, style: EnumStyle) -> Result<String> {
    check_name(&enumeration.name, "declaration name")?;
    match style {
        EnumStyle::Literal => Ok(format!(
            "{} = {}\n",
            enumeration.name,
            render_literal_set(&enumeration.values)
        )),
        EnumStyle::Class => {
            let mut src = format!("class {}(Enum):\n", enumeration.name);
            let mut seen = Vec::with_capacity(enumeration.values.len());
            for value in &enumeration.values {
                let member = match value {
                    Literal::String(s) if is_identifier(s) => s.as_str(),
                    other => {
                        return Err(SchemaError::UnrepresentableName {
                            name: enumeration.name.clone(),
                            reason: format!(
                                "enum value {} is not usable as a member name",
                                python_literal(other)
                            ),
                        });
                    }
                };
                if seen.contains(&member) {
                    return Err(SchemaError::UnrepresentableName {
                        name: enumeration.name.clone(),
                        reason: format!("duplicate enum member `{member}`"),
                    });
                }
                seen.push(member);
                src.push_str(&format!("{INDENT}{member} = {}\n", python_str(member)));
            }
            Ok(src)
        }
    }
}

// ---- type expressions ---- //

/// Class bodies are deferred by `from __future__ import annotations`; the
/// functional `TypedDict(...)` call evaluates its dict eagerly, so declared
/// names there must be string forward references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Names {
    Bare,
    Quoted,
}

fn render_ty(ty: &Ty, names: Names) -> Result<String> {
    Ok(match ty {
        Ty::Primitive(kind) => primitive(*kind).to_owned(),
        Ty::Named(name) => {
            check_name(name, "referenced type")?;
            match names {
                Names::Bare => name.clone(),
                Names::Quoted => python_str(name),
            }
        }
        Ty::AnyObject => "dict".to_owned(),
        Ty::ListOf(element) => format!("list[{}]", render_ty(element, names)?),
        Ty::UnionOf(members) => {
            let members = members
                .iter()
                .map(|member| render_ty(member, names))
                .collect::<Result<Vec<_>>>()?;
            format!("Union[{}]", members.join(", "))
        }
        Ty::LiteralEnum(values) => render_literal_set(values),
    })
}

fn primitive(kind: Kind) -> &'static str {
    match kind {
        Kind::Boolean => "bool",
        Kind::Integer => "int",
        Kind::Number => "float",
        Kind::String => "str",
        Kind::Null => "None",
    }
}

fn render_literal_set(values: &[Literal]) -> String {
    let values: Vec<String> = values.iter().map(python_literal).collect();
    format!("Literal[{}]", values.join(", "))
}

fn check_name(name: &str, role: &str) -> Result<()> {
    if is_identifier(name) {
        return Ok(());
    }
    Err(SchemaError::UnrepresentableName {
        name: name.to_owned(),
        reason: format!("{role} is not a Python identifier"),
    })
}

// ————————————————————————————————————————————————————————————————————————————
// PYTHON LITERALS
// ————————————————————————————————————————————————————————————————————————————

fn python_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "None".to_owned(),
        Literal::Boolean(true) => "True".to_owned(),
        Literal::Boolean(false) => "False".to_owned(),
        Literal::Integer(n) => n.to_string(),
        Literal::Number(n) => python_float(n.into_inner()),
        Literal::String(s) => python_str(s),
    }
}

fn python_float(n: f64) -> String {
    if n.is_nan() {
        return "float('nan')".to_owned();
    }
    if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        return format!("{sign}float('inf')");
    }
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") }
}

/// Single-quoted Python string literal.
fn python_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

use std::collections::{BTreeMap, BTreeSet};

use oavg_core::ir::{IrSchema, IrSpec, IrType};
use oavg_core::resolve::strict_name;
use oavg_core::union::Flavor;

/// Quote `s` as a TypeScript string literal.
pub fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Object key: bare when it is a valid identifier, quoted otherwise.
pub fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid { name.to_string() } else { quote(name) }
}

/// Identifier of `base` in `flavor`.
pub fn flavored(base: &str, flavor: Flavor) -> String {
    match flavor {
        Flavor::Loose => base.to_string(),
        Flavor::Strict => strict_name(base),
    }
}

/// Renders IR types as zod expressions and TypeScript types, recording every
/// named schema it mentions so the caller can emit imports.
pub struct TypeMapper<'a> {
    ir: &'a IrSpec,
    /// Schema whose file is being rendered; refs within its cycle are deferred.
    owner: Option<&'a str>,
    uses: BTreeMap<String, BTreeSet<String>>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(ir: &'a IrSpec, owner: Option<&'a str>) -> Self {
        Self {
            ir,
            owner,
            uses: BTreeMap::new(),
        }
    }

    /// Named schemas used so far: base identifier → flavored names.
    pub fn uses(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.uses
    }

    pub fn into_uses(self) -> BTreeMap<String, BTreeSet<String>> {
        self.uses
    }

    /// Record a use of `base` in `flavor` and return the flavored name.
    pub fn reference(&mut self, base: &str, flavor: Flavor) -> String {
        let name = flavored(base, flavor);
        if self.owner != Some(base) {
            self.uses
                .entry(base.to_string())
                .or_default()
                .insert(name.clone());
        }
        name
    }

    pub fn zod(&mut self, ty: &IrType, flavor: Flavor) -> String {
        match ty {
            IrType::String | IrType::DateTime => "z.string()".to_string(),
            IrType::StringLiteral(s) => format!("z.literal({})", quote(s)),
            IrType::Number => "z.number()".to_string(),
            IrType::Integer => "z.number().int()".to_string(),
            IrType::Boolean => "z.boolean()".to_string(),
            IrType::Null => "z.null()".to_string(),
            IrType::Void => "z.void()".to_string(),
            IrType::Any | IrType::Binary => "z.unknown()".to_string(),
            IrType::Array(inner) => format!("z.array({})", self.zod(inner, flavor)),
            IrType::Map(value) => format!("z.record(z.string(), {})", self.zod(value, flavor)),
            IrType::Object(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, field_type, required)| {
                        let expr = self.zod(field_type, flavor);
                        let expr = if *required { expr } else { format!("{expr}.optional()") };
                        format!("{}: {expr}", property_key(name))
                    })
                    .collect();
                object_expr(&rendered, flavor)
            }
            IrType::Ref(base) => {
                let deferred = self.owner.is_some_and(|owner| self.ir.same_cycle(owner, base));
                let name = self.reference(base, flavor);
                if deferred {
                    format!("z.lazy(() => {name})")
                } else {
                    name
                }
            }
            IrType::Union(variants) => {
                let nullable = variants.contains(&IrType::Null);
                let rest: Vec<&IrType> = variants.iter().filter(|v| **v != IrType::Null).collect();
                let inner = match rest.as_slice() {
                    [] => return "z.null()".to_string(),
                    [single] => self.zod(single, flavor),
                    many => {
                        let parts: Vec<String> = many.iter().map(|v| self.zod(v, flavor)).collect();
                        format!("z.union([{}])", parts.join(", "))
                    }
                };
                if nullable { format!("{inner}.nullable()") } else { inner }
            }
            IrType::Intersection(parts) => {
                // Parts are always loose; a strict part would reject its siblings' fields.
                let mut rendered = parts.iter().map(|p| self.zod(p, Flavor::Loose));
                let first = rendered.next().unwrap_or_else(|| "z.unknown()".to_string());
                rendered.fold(first, |acc, part| format!("{acc}.and({part})"))
            }
        }
    }

    /// Zod expression for a whole named schema.
    pub fn zod_schema(&mut self, schema: &IrSchema, flavor: Flavor) -> String {
        match schema {
            IrSchema::Object(o) => {
                let rendered: Vec<String> = o
                    .fields
                    .iter()
                    .map(|f| {
                        let expr = self.zod(&f.field_type, flavor);
                        let expr = if f.required { expr } else { format!("{expr}.optional()") };
                        format!("{}: {expr}", property_key(&f.original_name))
                    })
                    .collect();
                match &o.additional_properties {
                    Some(extra) => {
                        let extra = self.zod(extra, flavor);
                        format!("z.object({{ {} }}).catchall({extra})", rendered.join(", "))
                    }
                    None => object_expr(&rendered, flavor),
                }
            }
            IrSchema::Enum(e) => {
                let variants: Vec<String> = e.variants.iter().map(|v| quote(v)).collect();
                if variants.is_empty() {
                    "z.never()".to_string()
                } else {
                    format!("z.enum([{}])", variants.join(", "))
                }
            }
            IrSchema::Alias(a) => self.zod(&a.target, flavor),
            IrSchema::Union(u) => {
                let variants: Vec<String> = u.variants.iter().map(|v| self.zod(v, flavor)).collect();
                match variants.as_slice() {
                    [] => "z.never()".to_string(),
                    [single] => single.clone(),
                    _ => format!("z.union([{}])", variants.join(", ")),
                }
            }
        }
    }

    /// TypeScript type of `ty`; recursive schemas need it spelled out.
    pub fn ts(&mut self, ty: &IrType, flavor: Flavor) -> String {
        match ty {
            IrType::String | IrType::DateTime => "string".to_string(),
            IrType::StringLiteral(s) => quote(s),
            IrType::Number | IrType::Integer => "number".to_string(),
            IrType::Boolean => "boolean".to_string(),
            IrType::Null => "null".to_string(),
            IrType::Void => "void".to_string(),
            IrType::Any | IrType::Binary => "unknown".to_string(),
            IrType::Ref(base) => self.reference(base, flavor),
            IrType::Array(inner) => {
                let inner_ts = self.ts(inner, flavor);
                if inner_ts.contains('|') || inner_ts.contains('&') {
                    format!("({inner_ts})[]")
                } else {
                    format!("{inner_ts}[]")
                }
            }
            IrType::Map(value) => format!("Record<string, {}>", self.ts(value, flavor)),
            IrType::Object(fields) => {
                if fields.is_empty() {
                    return "Record<string, never>".to_string();
                }
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, field_type, required)| {
                        let t = self.ts(field_type, flavor);
                        let optional = if *required { "" } else { "?" };
                        format!("{}{optional}: {t}", property_key(name))
                    })
                    .collect();
                format!("{{ {} }}", rendered.join("; "))
            }
            IrType::Union(variants) => {
                let rendered: Vec<String> = variants.iter().map(|v| self.ts(v, flavor)).collect();
                rendered.join(" | ")
            }
            IrType::Intersection(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| self.ts(p, Flavor::Loose)).collect();
                rendered.join(" & ")
            }
        }
    }

    pub fn ts_schema(&mut self, schema: &IrSchema, flavor: Flavor) -> String {
        match schema {
            IrSchema::Object(o) => {
                let mut rendered: Vec<String> = o
                    .fields
                    .iter()
                    .map(|f| {
                        let t = self.ts(&f.field_type, flavor);
                        let optional = if f.required { "" } else { "?" };
                        format!("{}{optional}: {t}", property_key(&f.original_name))
                    })
                    .collect();
                if let Some(extra) = &o.additional_properties {
                    rendered.push(format!("[key: string]: {}", self.ts(extra, flavor)));
                }
                format!("{{ {} }}", rendered.join("; "))
            }
            IrSchema::Enum(e) => {
                let variants: Vec<String> = e.variants.iter().map(|v| quote(v)).collect();
                if variants.is_empty() { "never".to_string() } else { variants.join(" | ") }
            }
            IrSchema::Alias(a) => self.ts(&a.target, flavor),
            IrSchema::Union(u) => {
                let rendered: Vec<String> = u.variants.iter().map(|v| self.ts(v, flavor)).collect();
                rendered.join(" | ")
            }
        }
    }
}

fn object_expr(fields: &[String], flavor: Flavor) -> String {
    let body = if fields.is_empty() {
        "z.object({})".to_string()
    } else {
        format!("z.object({{ {} }})", fields.join(", "))
    };
    match flavor {
        Flavor::Loose => format!("{body}.passthrough()"),
        Flavor::Strict => format!("{body}.strict()"),
    }
}

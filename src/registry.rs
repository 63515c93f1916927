use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use crate::class_name::ClassName;
use crate::error::{ClassError, Result};
use crate::scope::ResourceScope;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(0x0001);
    pub const PRIVATE: Self = Self(0x0002);
    pub const PROTECTED: Self = Self(0x0004);
    pub const STATIC: Self = Self(0x0008);
    pub const FINAL: Self = Self(0x0010);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_public_static(self) -> bool {
        self.contains(Self(Self::PUBLIC.0 | Self::STATIC.0))
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({self})")
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::PUBLIC, "public"),
            (Self::PROTECTED, "protected"),
            (Self::PRIVATE, "private"),
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
        ];
        let words: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&words.join(" "))
    }
}

impl Serialize for Modifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Null => f.write_str("null"),
        }
    }
}

pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub modifiers: Modifiers,
    /// Descriptor such as `(I)I`; informational only.
    pub descriptor: String,
    pub handle: MethodFn,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub value: Value,
    pub readable: bool,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: ClassName,
    pub superclass: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
    pub origin: Option<Arc<dyn ResourceScope>>,
}

impl ClassDef {
    pub fn new(name: ClassName) -> Self {
        Self {
            name,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            origin: None,
        }
    }

    pub fn extends(mut self, superclass: ClassName) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: ClassName) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn method<F>(mut self, name: &str, modifiers: Modifiers, descriptor: &str, handle: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push(MethodDef {
            name: name.to_string(),
            modifiers,
            descriptor: descriptor.to_string(),
            handle: Arc::new(handle),
        });
        self
    }

    pub fn field(mut self, name: &str, modifiers: Modifiers, value: Value) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            modifiers,
            value,
            readable: true,
        });
        self
    }

    pub fn sealed_field(mut self, name: &str, modifiers: Modifiers, value: Value) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            modifiers,
            value,
            readable: false,
        });
        self
    }

    pub fn defined_by(mut self, origin: Arc<dyn ResourceScope>) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn resource_path(&self) -> String {
        self.name.resource_path()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ClassDef>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassDef) -> Option<Arc<ClassDef>> {
        self.classes
            .insert(class.name.as_str().to_string(), Arc::new(class))
    }

    pub fn get(&self, class_name: &str) -> Option<Arc<ClassDef>> {
        self.classes.get(class_name).cloned()
    }

    pub fn load(&self, class_name: &str) -> Result<Arc<ClassDef>> {
        self.get(class_name)
            .ok_or_else(|| ClassError::NotFound(format!("class not found [{class_name}]")))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn platform() -> Self {
        let mut registry = Self::new();
        registry.register(object_class());
        registry.register(serializable_interface());
        registry.register(number_class());
        registry.register(integer_class());
        registry.register(long_class());
        registry.register(math_class());
        registry
    }
}

const PUBLIC_STATIC: Modifiers = Modifiers(0x0001 | 0x0008);
const PUBLIC_STATIC_FINAL: Modifiers = Modifiers(0x0001 | 0x0008 | 0x0010);
const PRIVATE_STATIC_FINAL: Modifiers = Modifiers(0x0002 | 0x0008 | 0x0010);

fn object_class() -> ClassDef {
    ClassDef::new(ClassName::known("java.lang.Object"))
        .method("hashCode", Modifiers::PUBLIC, "()I", |_| {
            Err(ClassError::Argument("hashCode requires an instance".to_string()))
        })
        .method("toString", Modifiers::PUBLIC, "()Ljava/lang/String;", |_| {
            Err(ClassError::Argument("toString requires an instance".to_string()))
        })
        .method("registerNatives", Modifiers::PRIVATE | Modifiers::STATIC, "()V", |_| {
            Ok(Value::Null)
        })
}

fn serializable_interface() -> ClassDef {
    ClassDef::new(ClassName::known("java.io.Serializable"))
}

fn number_class() -> ClassDef {
    ClassDef::new(ClassName::known("java.lang.Number"))
        .extends(ClassName::known("java.lang.Object"))
        .implements(ClassName::known("java.io.Serializable"))
        .method("intValue", Modifiers::PUBLIC, "()I", |_| {
            Err(ClassError::Argument("intValue requires an instance".to_string()))
        })
}

fn integer_class() -> ClassDef {
    ClassDef::new(ClassName::known("java.lang.Integer"))
        .extends(ClassName::known("java.lang.Number"))
        .field("MAX_VALUE", PUBLIC_STATIC_FINAL, Value::Int(i32::MAX))
        .field("MIN_VALUE", PUBLIC_STATIC_FINAL, Value::Int(i32::MIN))
        .field("SIZE", PUBLIC_STATIC_FINAL, Value::Int(32))
        .field("BYTES", PUBLIC_STATIC_FINAL, Value::Int(4))
        .field("value", Modifiers::PRIVATE | Modifiers::FINAL, Value::Int(0))
        .field(
            "serialVersionUID",
            PRIVATE_STATIC_FINAL,
            Value::Long(1_360_826_667_806_852_920),
        )
        .method("parseInt", PUBLIC_STATIC, "(Ljava/lang/String;)I", |args| {
            let raw = str_arg(args, 0, "parseInt")?;
            raw.trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| ClassError::Argument(format!("for input string [{raw}]")))
        })
        .method("valueOf", PUBLIC_STATIC, "(I)Ljava/lang/Integer;", |args| {
            Ok(Value::Int(int_arg(args, 0, "valueOf")?))
        })
        .method("max", PUBLIC_STATIC, "(II)I", |args| {
            Ok(Value::Int(int_arg(args, 0, "max")?.max(int_arg(args, 1, "max")?)))
        })
        .method("sum", PUBLIC_STATIC, "(II)I", |args| {
            Ok(Value::Int(int_arg(args, 0, "sum")?.wrapping_add(int_arg(args, 1, "sum")?)))
        })
}

fn long_class() -> ClassDef {
    ClassDef::new(ClassName::known("java.lang.Long"))
        .extends(ClassName::known("java.lang.Number"))
        .field("MAX_VALUE", PUBLIC_STATIC_FINAL, Value::Long(i64::MAX))
        .field("MIN_VALUE", PUBLIC_STATIC_FINAL, Value::Long(i64::MIN))
        .field("SIZE", PUBLIC_STATIC_FINAL, Value::Int(64))
        .method("parseLong", PUBLIC_STATIC, "(Ljava/lang/String;)J", |args| {
            let raw = str_arg(args, 0, "parseLong")?;
            raw.trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| ClassError::Argument(format!("for input string [{raw}]")))
        })
}

fn math_class() -> ClassDef {
    ClassDef::new(ClassName::known("java.lang.Math"))
        .extends(ClassName::known("java.lang.Object"))
        .field("PI", PUBLIC_STATIC_FINAL, Value::Double(std::f64::consts::PI))
        .field("E", PUBLIC_STATIC_FINAL, Value::Double(std::f64::consts::E))
        .field(
            "negativeZeroDoubleBits",
            PRIVATE_STATIC_FINAL,
            Value::Long((-0.0f64).to_bits() as i64),
        )
        .method("abs", PUBLIC_STATIC, "(I)I", |args| {
            Ok(Value::Int(int_arg(args, 0, "abs")?.wrapping_abs()))
        })
        .method("abs", PUBLIC_STATIC, "(J)J", |args| match args.first() {
            Some(Value::Long(v)) => Ok(Value::Long(v.wrapping_abs())),
            _ => Err(bad_argument("abs", 0)),
        })
        .method("abs", PUBLIC_STATIC, "(D)D", |args| {
            Ok(Value::Double(double_arg(args, 0, "abs")?.abs()))
        })
        .method("max", PUBLIC_STATIC, "(II)I", |args| {
            Ok(Value::Int(int_arg(args, 0, "max")?.max(int_arg(args, 1, "max")?)))
        })
        .method("min", PUBLIC_STATIC, "(II)I", |args| {
            Ok(Value::Int(int_arg(args, 0, "min")?.min(int_arg(args, 1, "min")?)))
        })
        .method("sqrt", PUBLIC_STATIC, "(D)D", |args| {
            Ok(Value::Double(double_arg(args, 0, "sqrt")?.sqrt()))
        })
        .method("pow", PUBLIC_STATIC, "(DD)D", |args| {
            Ok(Value::Double(double_arg(args, 0, "pow")?.powf(double_arg(args, 1, "pow")?)))
        })
}

fn bad_argument(method: &str, index: usize) -> ClassError {
    ClassError::Argument(format!("illegal argument #{index} for method [{method}]"))
}

fn int_arg(args: &[Value], index: usize, method: &str) -> Result<i32> {
    match args.get(index) {
        Some(Value::Int(v)) => Ok(*v),
        _ => Err(bad_argument(method, index)),
    }
}

fn double_arg(args: &[Value], index: usize, method: &str) -> Result<f64> {
    match args.get(index) {
        Some(Value::Double(v)) => Ok(*v),
        Some(Value::Float(v)) => Ok(f64::from(*v)),
        Some(Value::Int(v)) => Ok(f64::from(*v)),
        _ => Err(bad_argument(method, index)),
    }
}

fn str_arg<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(Value::Str(v)) => Ok(v.as_str()),
        _ => Err(bad_argument(method, index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_check_public_and_static_together() {
        assert!((Modifiers::PUBLIC | Modifiers::STATIC).is_public_static());
        assert!(PUBLIC_STATIC_FINAL.is_public_static());
        assert!(!Modifiers::PUBLIC.is_public_static());
        assert!(!(Modifiers::PRIVATE | Modifiers::STATIC).is_public_static());
        assert_eq!(PUBLIC_STATIC_FINAL.to_string(), "public static final");
    }

    #[test]
    fn register_replaces_previous_definition() {
        let mut registry = ClassRegistry::new();
        let name = ClassName::new("a.B").unwrap();
        assert!(registry.register(ClassDef::new(name.clone())).is_none());
        let previous = registry.register(
            ClassDef::new(name).field("X", PUBLIC_STATIC, Value::Int(1)),
        );
        assert!(previous.is_some_and(|p| p.fields.is_empty()));
        assert_eq!(registry.load("a.B").unwrap().fields.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn load_unknown_class_is_not_found() {
        let err = ClassRegistry::new().load("a.Missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "class not found [a.Missing]");
    }

    #[test]
    fn platform_classes_have_no_origin() {
        let registry = ClassRegistry::platform();
        assert!(registry.contains("java.lang.Integer"));
        assert!(registry.contains("java.lang.Math"));
        for name in registry.class_names() {
            assert!(registry.load(name).unwrap().origin.is_none());
        }
    }

    #[test]
    fn value_serializes_with_type_tag() {
        let json = serde_json::to_value(Value::Int(7)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "value": 7}));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), serde_json::json!({"type": "null"}));
    }
}

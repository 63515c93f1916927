//! Name-based lookup of public static methods and constants.
//!
//! Lookups walk the class and its supertypes: the class's own members in
//! registration order, then its superclass (recursively, including that
//! superclass's interfaces), then its own interfaces. The first member whose
//! name matches wins. Overloads are not told apart by signature, so which
//! overload of a name is returned is unspecified and must not be relied on.
//!
//! Only public members take part in the first-match search, so a private or
//! protected member never hides a public one of the same name. A public match
//! that is not static, or a name that exists only on non-public members, is a
//! visibility error rather than a not-found error.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::class_name::ClassName;
use crate::error::{ClassError, Result, require_non_empty};
use crate::registry::{ClassDef, ClassRegistry, FieldDef, MethodDef, MethodFn, Modifiers, Value};

#[derive(Clone, Serialize)]
pub struct MethodRef {
    pub owner: ClassName,
    pub name: String,
    pub modifiers: Modifiers,
    pub descriptor: String,
    #[serde(skip)]
    handle: MethodFn,
}

impl MethodRef {
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.handle)(args)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRef")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantRef {
    pub owner: ClassName,
    pub name: String,
    pub value: Value,
}

/// Produced on demand and never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedMember {
    Method(MethodRef),
    Constant(ConstantRef),
}

pub fn resolve_method(registry: &ClassRegistry, class_name: &str, method_name: &str) -> Result<MethodRef> {
    require_non_empty(class_name, "className")?;
    require_non_empty(method_name, "methodName")?;

    let types = hierarchy(registry, registry.load(class_name)?)?;
    let public = first_match(&types, |c| c.methods.as_slice(), |m: &MethodDef| {
        m.name == method_name && m.modifiers.contains(Modifiers::PUBLIC)
    });

    let Some((owner, method)) = public else {
        if first_match(&types, |c| c.methods.as_slice(), |m: &MethodDef| m.name == method_name).is_some() {
            return Err(method_visibility(class_name, method_name));
        }
        return Err(ClassError::NotFound(format!(
            "class#method not found [{class_name}#{method_name}]"
        )));
    };
    if !method.modifiers.is_public_static() {
        return Err(method_visibility(class_name, method_name));
    }

    debug!(class = class_name, method = method_name, owner = %owner, descriptor = %method.descriptor, "method resolved");
    Ok(MethodRef {
        owner,
        name: method.name,
        modifiers: method.modifiers,
        descriptor: method.descriptor,
        handle: method.handle,
    })
}

pub fn resolve_constant(registry: &ClassRegistry, class_name: &str, constant_name: &str) -> Result<ConstantRef> {
    require_non_empty(class_name, "className")?;
    require_non_empty(constant_name, "constantName")?;

    let types = hierarchy(registry, registry.load(class_name)?)?;
    let public = first_match(&types, |c| c.fields.as_slice(), |f: &FieldDef| {
        f.name == constant_name && f.modifiers.contains(Modifiers::PUBLIC)
    });

    let Some((owner, field)) = public else {
        if first_match(&types, |c| c.fields.as_slice(), |f: &FieldDef| f.name == constant_name).is_some() {
            return Err(constant_visibility(class_name, constant_name));
        }
        return Err(ClassError::NotFound(format!(
            "class#constant not found [{class_name}#{constant_name}]"
        )));
    };
    if !field.modifiers.is_public_static() {
        return Err(constant_visibility(class_name, constant_name));
    }
    if !field.readable {
        return Err(ClassError::Access(format!(
            "class#constant cannot be read [{class_name}#{constant_name}]"
        )));
    }

    Ok(ConstantRef {
        owner,
        name: field.name,
        value: field.value,
    })
}

fn method_visibility(class_name: &str, method_name: &str) -> ClassError {
    ClassError::Visibility(format!(
        "class#method does not have PUBLIC or STATIC modifier [{class_name}#{method_name}]"
    ))
}

fn constant_visibility(class_name: &str, constant_name: &str) -> ClassError {
    ClassError::Visibility(format!(
        "class#constant does not have PUBLIC or STATIC modifier [{class_name}#{constant_name}]"
    ))
}

fn first_match<T: Clone>(
    types: &[Arc<ClassDef>],
    members: impl Fn(&ClassDef) -> &[T],
    matches: impl Fn(&T) -> bool,
) -> Option<(ClassName, T)> {
    types.iter().find_map(|owner| {
        members(owner.as_ref())
            .iter()
            .find(|m| matches(*m))
            .map(|m| (owner.name.clone(), m.clone()))
    })
}

/// The class followed by its supertypes in lookup order, each visited once.
fn hierarchy(registry: &ClassRegistry, class: Arc<ClassDef>) -> Result<Vec<Arc<ClassDef>>> {
    let mut ordered = Vec::new();
    let mut seen = HashSet::new();
    collect(registry, class, &mut seen, &mut ordered)?;
    Ok(ordered)
}

fn collect(
    registry: &ClassRegistry,
    class: Arc<ClassDef>,
    seen: &mut HashSet<ClassName>,
    ordered: &mut Vec<Arc<ClassDef>>,
) -> Result<()> {
    if !seen.insert(class.name.clone()) {
        return Ok(());
    }
    ordered.push(Arc::clone(&class));

    if let Some(superclass) = class.superclass.as_ref() {
        collect(registry, registry.load(superclass.as_str())?, seen, ordered)?;
    }
    for interface in &class.interfaces {
        collect(registry, registry.load(interface.as_str())?, seen, ordered)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> ClassName {
        ClassName::new(raw).unwrap()
    }

    fn sample_registry() -> ClassRegistry {
        let public_static = Modifiers::PUBLIC | Modifiers::STATIC;
        let mut registry = ClassRegistry::platform();
        registry.register(
            ClassDef::new(name("com.example.Constants"))
                .implements(name("com.example.HasVersion"))
                .field("LIMIT", public_static | Modifiers::FINAL, Value::Int(10))
                .field("hidden", Modifiers::PRIVATE | Modifiers::STATIC, Value::Int(1))
                .field("instanceField", Modifiers::PUBLIC, Value::Int(2))
                .sealed_field("LOCKED", public_static, Value::Str("secret".to_string()))
                .method("helper", Modifiers::PUBLIC, "()V", |_| Ok(Value::Null))
                .method("internal", Modifiers::PROTECTED | Modifiers::STATIC, "()V", |_| {
                    Ok(Value::Null)
                }),
        );
        registry.register(
            ClassDef::new(name("com.example.HasVersion"))
                .field("VERSION", public_static | Modifiers::FINAL, Value::Str("1.2".to_string())),
        );
        registry
    }

    #[test]
    fn integer_max_value_resolves() {
        let registry = ClassRegistry::platform();
        let constant = resolve_constant(&registry, "java.lang.Integer", "MAX_VALUE").unwrap();
        assert_eq!(constant.value, Value::Int(2_147_483_647));
        assert_eq!(constant.owner.as_str(), "java.lang.Integer");
    }

    #[test]
    fn math_abs_resolves_to_some_overload() {
        let registry = ClassRegistry::platform();
        let method = resolve_method(&registry, "java.lang.Math", "abs").unwrap();
        assert_eq!(method.name, "abs");
        assert!(method.modifiers.is_public_static());
    }

    #[test]
    fn resolved_method_is_invocable() {
        let registry = ClassRegistry::platform();
        let method = resolve_method(&registry, "java.lang.Integer", "parseInt").unwrap();
        assert_eq!(method.invoke(&[Value::Str(" 42".to_string())]).unwrap(), Value::Int(42));
        assert!(matches!(
            method.invoke(&[Value::Str("x".to_string())]),
            Err(ClassError::Argument(_))
        ));
    }

    #[test]
    fn unknown_class_is_not_found() {
        let registry = ClassRegistry::platform();
        let err = resolve_method(&registry, "com.example.Nope", "run").unwrap_err();
        assert_eq!(err.to_string(), "class not found [com.example.Nope]");
        let err = resolve_constant(&registry, "com.example.Nope", "X").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unknown_method_is_not_found() {
        let registry = ClassRegistry::platform();
        let err = resolve_method(&registry, "java.lang.Math", "nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "class#method not found [java.lang.Math#nope]");
    }

    #[test]
    fn non_static_or_non_public_method_is_visibility_error() {
        let registry = sample_registry();
        for method in ["helper", "internal"] {
            let err = resolve_method(&registry, "com.example.Constants", method).unwrap_err();
            assert!(err.is_visibility(), "{method}: {err}");
        }
    }

    #[test]
    fn inherited_instance_method_is_visibility_error() {
        let registry = ClassRegistry::platform();
        let err = resolve_method(&registry, "java.lang.Math", "hashCode").unwrap_err();
        assert!(err.is_visibility());
        assert!(err.to_string().contains("[java.lang.Math#hashCode]"));

        let err = resolve_method(&registry, "java.lang.Integer", "registerNatives").unwrap_err();
        assert!(err.is_visibility());
    }

    #[test]
    fn constant_modifier_checks() {
        let registry = sample_registry();
        assert!(resolve_constant(&registry, "com.example.Constants", "missing")
            .unwrap_err()
            .is_not_found());
        assert!(resolve_constant(&registry, "com.example.Constants", "hidden")
            .unwrap_err()
            .is_visibility());
        assert!(resolve_constant(&registry, "com.example.Constants", "instanceField")
            .unwrap_err()
            .is_visibility());
        assert!(resolve_constant(&registry, "java.lang.Integer", "value")
            .unwrap_err()
            .is_visibility());
    }

    #[test]
    fn unreadable_constant_is_access_error() {
        let registry = sample_registry();
        let err = resolve_constant(&registry, "com.example.Constants", "LOCKED").unwrap_err();
        assert!(matches!(err, ClassError::Access(_)));
    }

    #[test]
    fn interface_constants_are_inherited() {
        let registry = sample_registry();
        let constant = resolve_constant(&registry, "com.example.Constants", "VERSION").unwrap();
        assert_eq!(constant.value, Value::Str("1.2".to_string()));
        assert_eq!(constant.owner.as_str(), "com.example.HasVersion");
    }

    #[test]
    fn empty_inputs_are_argument_errors() {
        let registry = ClassRegistry::platform();
        assert!(matches!(resolve_method(&registry, "", "abs"), Err(ClassError::Argument(_))));
        assert!(matches!(
            resolve_constant(&registry, "java.lang.Integer", ""),
            Err(ClassError::Argument(_))
        ));
    }

    #[test]
    fn missing_supertype_is_not_found() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassDef::new(name("a.Child")).extends(name("a.Parent")));
        let err = resolve_method(&registry, "a.Child", "run").unwrap_err();
        assert_eq!(err.to_string(), "class not found [a.Parent]");
    }

    #[test]
    fn private_overload_does_not_hide_public_static_one() {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassDef::new(name("a.Util"))
                .method("run", Modifiers::PRIVATE | Modifiers::STATIC, "(J)V", |_| Ok(Value::Null))
                .method("run", Modifiers::PUBLIC | Modifiers::STATIC, "(I)V", |_| Ok(Value::Int(1))),
        );

        let method = resolve_method(&registry, "a.Util", "run").unwrap();
        assert_eq!(method.descriptor, "(I)V");
        assert_eq!(method.invoke(&[]).unwrap(), Value::Int(1));
    }

    #[test]
    fn private_field_does_not_hide_inherited_public_constant() {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassDef::new(name("a.Base")).field("LIMIT", Modifiers::PUBLIC | Modifiers::STATIC, Value::Int(5)),
        );
        registry.register(
            ClassDef::new(name("a.Sub"))
                .extends(name("a.Base"))
                .field("LIMIT", Modifiers::PRIVATE, Value::Int(7)),
        );

        let constant = resolve_constant(&registry, "a.Sub", "LIMIT").unwrap();
        assert_eq!(constant.value, Value::Int(5));
        assert_eq!(constant.owner.as_str(), "a.Base");
    }

    #[test]
    fn public_instance_match_is_visibility_error_even_with_later_static() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassDef::new(name("a.Base")).method(
            "run",
            Modifiers::PUBLIC | Modifiers::STATIC,
            "()V",
            |_| Ok(Value::Null),
        ));
        registry.register(
            ClassDef::new(name("a.Sub"))
                .extends(name("a.Base"))
                .method("run", Modifiers::PUBLIC, "()V", |_| Ok(Value::Null)),
        );

        let err = resolve_method(&registry, "a.Sub", "run").unwrap_err();
        assert!(err.is_visibility());
    }

    #[test]
    fn resolved_member_serializes_with_kind() {
        let registry = ClassRegistry::platform();
        let member = ResolvedMember::Constant(
            resolve_constant(&registry, "java.lang.Long", "SIZE").unwrap(),
        );
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["kind"], "constant");
        assert_eq!(json["value"]["value"], 64);
    }
}

//! Raw tree to canonical model.
//!
//! Merge order is fixed: base definitions are collected first, partials are
//! merged into them (or become them), `includes` statements are applied next
//! and inheritance is flattened last. Every merge is an explicit append onto
//! the owning definition.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::{enum_identifier, Dictionary, Enum, EnumValue, Interface, Model, Typedef};
use crate::diagnostic::{CompilerError, DefinitionKind};
use crate::frontend::ast::{
    Definition, DictionaryDecl, Field, IncludesDecl, InterfaceDecl, Member, MixinDecl,
};

/// Builds the canonical model from a parsed document.
pub fn normalize(definitions: Vec<Definition>) -> Result<Model, CompilerError> {
    let mut partitions = Partitions::default();
    for definition in definitions {
        partitions.add(definition)?;
    }

    let Partitions {
        mut interfaces,
        mut mixins,
        mut dictionaries,
        enums,
        typedefs,
        partial_interfaces,
        partial_mixins,
        partial_dictionaries,
        includes,
        ..
    } = partitions;

    for partial in partial_mixins {
        match mixins.get_mut(&partial.name) {
            Some(base) => base.members.extend(partial.members),
            None => {
                mixins.insert(partial.name.clone(), partial);
            }
        }
    }

    for partial in partial_interfaces {
        match interfaces.get_mut(&partial.name) {
            Some(base) => base.members.extend(partial.members),
            None => {
                interfaces.insert(partial.name.clone(), partial);
            }
        }
    }

    for partial in partial_dictionaries {
        match dictionaries.get_mut(&partial.name) {
            Some(base) => base.members.extend(partial.members),
            None => {
                dictionaries.insert(partial.name.clone(), partial);
            }
        }
    }

    apply_includes(&mut interfaces, &mixins, &includes)?;

    let model = Model {
        interfaces: flatten_interfaces(&interfaces)?,
        dictionaries: flatten_dictionaries(&dictionaries)?,
        enums,
        typedefs,
    };

    debug!(
        interfaces = model.interfaces.len(),
        dictionaries = model.dictionaries.len(),
        enums = model.enums.len(),
        typedefs = model.typedefs.len(),
        includes = includes.len(),
        "normalized model"
    );

    Ok(model)
}

/// Top-level definitions sorted by kind, in declaration order.
#[derive(Default)]
struct Partitions {
    interfaces: IndexMap<String, InterfaceDecl>,
    mixins: IndexMap<String, MixinDecl>,
    dictionaries: IndexMap<String, DictionaryDecl>,
    enums: IndexMap<String, Enum>,
    typedefs: IndexMap<String, Typedef>,
    partial_interfaces: Vec<InterfaceDecl>,
    partial_mixins: Vec<MixinDecl>,
    partial_dictionaries: Vec<DictionaryDecl>,
    includes: Vec<IncludesDecl>,
    /// Names of non-partial definitions of any kind.
    declared: HashMap<String, DefinitionKind>,
}

impl Partitions {
    fn add(&mut self, definition: Definition) -> Result<(), CompilerError> {
        match definition {
            Definition::Interface(decl) if decl.partial => self.partial_interfaces.push(decl),
            Definition::Mixin(decl) if decl.partial => self.partial_mixins.push(decl),
            Definition::Dictionary(decl) if decl.partial => self.partial_dictionaries.push(decl),
            Definition::Includes(decl) => self.includes.push(decl),
            Definition::Interface(decl) => {
                self.declare(&decl.name, DefinitionKind::Interface)?;
                self.interfaces.insert(decl.name.clone(), decl);
            }
            Definition::Mixin(decl) => {
                self.declare(&decl.name, DefinitionKind::Mixin)?;
                self.mixins.insert(decl.name.clone(), decl);
            }
            Definition::Dictionary(decl) => {
                self.declare(&decl.name, DefinitionKind::Dictionary)?;
                self.dictionaries.insert(decl.name.clone(), decl);
            }
            Definition::Enum(decl) => {
                self.declare(&decl.name, DefinitionKind::Enum)?;
                let values = enum_values(&decl.name, decl.values)?;
                self.enums.insert(
                    decl.name.clone(),
                    Enum {
                        name: decl.name,
                        values,
                    },
                );
            }
            Definition::Typedef(decl) => {
                self.declare(&decl.name, DefinitionKind::Typedef)?;
                self.typedefs.insert(
                    decl.name.clone(),
                    Typedef {
                        name: decl.name,
                        target: decl.idl_type,
                    },
                );
            }
        }
        Ok(())
    }

    fn declare(&mut self, name: &str, kind: DefinitionKind) -> Result<(), CompilerError> {
        if self.declared.insert(name.to_string(), kind).is_some() {
            return Err(CompilerError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Deduplicates enum literals and assigns native identifiers.
fn enum_values(enum_name: &str, literals: Vec<String>) -> Result<Vec<EnumValue>, CompilerError> {
    let mut values: Vec<EnumValue> = Vec::with_capacity(literals.len());
    for literal in literals {
        if values.iter().any(|v| v.literal == literal) {
            continue;
        }
        let ident = enum_identifier(&literal);
        if let Some(existing) = values.iter().find(|v| v.ident == ident) {
            return Err(CompilerError::EnumIdentifierCollision {
                enum_name: enum_name.to_string(),
                first: existing.literal.clone(),
                second: literal,
                identifier: ident,
            });
        }
        values.push(EnumValue { literal, ident });
    }
    Ok(values)
}

fn apply_includes(
    interfaces: &mut IndexMap<String, InterfaceDecl>,
    mixins: &IndexMap<String, MixinDecl>,
    includes: &[IncludesDecl],
) -> Result<(), CompilerError> {
    for include in includes {
        let unresolved = |missing: &str| CompilerError::UnresolvedInclude {
            target: include.target.clone(),
            mixin: include.includes.clone(),
            missing: missing.to_string(),
        };

        let mixin = mixins
            .get(&include.includes)
            .ok_or_else(|| unresolved(&include.includes))?;
        let target = interfaces
            .get_mut(&include.target)
            .ok_or_else(|| unresolved(&include.target))?;

        target.members.extend(mixin.members.iter().cloned());
    }
    Ok(())
}

/// Walks the inheritance chain of `name`, returning it nearest ancestor first.
fn ancestor_chain<'a, F>(
    name: &'a str,
    kind: DefinitionKind,
    parent_of: F,
) -> Result<Vec<&'a str>, CompilerError>
where
    F: Fn(&str) -> Option<Option<&'a str>>,
{
    let mut chain = Vec::new();
    let mut visited = vec![name];
    let mut current = name;

    while let Some(parent) = parent_of(current).flatten() {
        if visited.contains(&parent) {
            let mut cycle: Vec<String> = visited.iter().map(|s| s.to_string()).collect();
            cycle.push(parent.to_string());
            return Err(CompilerError::InheritanceCycle { kind, cycle });
        }
        if parent_of(parent).is_none() {
            return Err(CompilerError::UnresolvedAncestor {
                kind,
                name: current.to_string(),
                ancestor: parent.to_string(),
            });
        }
        chain.push(parent);
        visited.push(parent);
        current = parent;
    }

    Ok(chain)
}

fn flatten_interfaces(
    decls: &IndexMap<String, InterfaceDecl>,
) -> Result<IndexMap<String, Interface>, CompilerError> {
    let parent_of = |name: &str| decls.get(name).map(|d| d.inheritance.as_deref());

    let mut interfaces = IndexMap::with_capacity(decls.len());
    for decl in decls.values() {
        let mut members = decl.members.clone();
        for ancestor in ancestor_chain(&decl.name, DefinitionKind::Interface, parent_of)? {
            let Some(ancestor) = decls.get(ancestor) else {
                continue;
            };
            for member in &ancestor.members {
                let inherited = match member {
                    // Constructors are never inherited.
                    Member::Constructor(_) => false,
                    Member::Operation(op) => !members
                        .iter()
                        .any(|m| matches!(m, Member::Operation(o) if o.name == op.name)),
                    Member::Attribute(attr) => !members
                        .iter()
                        .any(|m| matches!(m, Member::Attribute(a) if a.name == attr.name)),
                };
                if inherited {
                    members.push(member.clone());
                }
            }
        }
        interfaces.insert(
            decl.name.clone(),
            Interface {
                name: decl.name.clone(),
                members,
            },
        );
    }
    Ok(interfaces)
}

fn flatten_dictionaries(
    decls: &IndexMap<String, DictionaryDecl>,
) -> Result<IndexMap<String, Dictionary>, CompilerError> {
    let parent_of = |name: &str| decls.get(name).map(|d| d.inheritance.as_deref());

    let mut dictionaries = IndexMap::with_capacity(decls.len());
    for decl in decls.values() {
        let mut members: Vec<Field> = decl.members.clone();
        for ancestor in ancestor_chain(&decl.name, DefinitionKind::Dictionary, parent_of)? {
            let Some(ancestor) = decls.get(ancestor) else {
                continue;
            };
            for field in &ancestor.members {
                if !members.iter().any(|m| m.name == field.name) {
                    members.push(field.clone());
                }
            }
        }
        dictionaries.insert(
            decl.name.clone(),
            Dictionary {
                name: decl.name.clone(),
                members,
            },
        );
    }
    Ok(dictionaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::idl::parse_str;

    fn normalize_idl(source: &str) -> Result<Model, CompilerError> {
        normalize(parse_str(source).unwrap())
    }

    fn member_names(iface: &Interface) -> Vec<&str> {
        iface
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Operation(op) => Some(op.name.as_str()),
                Member::Attribute(attr) => Some(attr.name.as_str()),
                Member::Constructor(_) => None,
            })
            .collect()
    }

    #[test]
    fn merges_partials_and_mixins() {
        let model = normalize_idl(
            r#"
            interface A { undefined foo(); };
            partial interface A { undefined bar(); };
            interface mixin M { undefined baz(); };
            A includes M;
            "#,
        )
        .unwrap();
        assert_eq!(member_names(&model.interfaces["A"]), ["foo", "bar", "baz"]);
    }

    #[test]
    fn partial_without_base_becomes_the_base() {
        let model = normalize_idl("partial interface A { undefined bar(); };").unwrap();
        assert_eq!(member_names(&model.interfaces["A"]), ["bar"]);
    }

    #[test]
    fn partial_declared_before_base_merges() {
        let model = normalize_idl(
            r#"
            partial interface A { undefined bar(); };
            interface A { undefined foo(); };
            "#,
        )
        .unwrap();
        assert_eq!(member_names(&model.interfaces["A"]), ["foo", "bar"]);
    }

    #[test]
    fn includes_may_target_partial_only_interfaces() {
        let model = normalize_idl(
            r#"
            Navigator includes NavigatorGPU;
            interface mixin NavigatorGPU { [SameObject] readonly attribute GPU gpu; };
            partial interface Navigator { };
            partial interface mixin NavigatorGPU { undefined extra(); };
            "#,
        )
        .unwrap();
        assert_eq!(member_names(&model.interfaces["Navigator"]), ["gpu", "extra"]);
    }

    #[test]
    fn dictionary_inheritance_appends_ancestor_members() {
        let model = normalize_idl(
            r#"
            dictionary Base { long x; };
            dictionary Derived : Base { DOMString y; };
            dictionary Leaf : Derived { boolean z; };
            "#,
        )
        .unwrap();
        let names = |d: &str| -> Vec<String> {
            model.dictionaries[d]
                .members
                .iter()
                .map(|m| m.name.clone())
                .collect()
        };
        assert_eq!(names("Derived"), ["y", "x"]);
        assert_eq!(names("Leaf"), ["z", "y", "x"]);
    }

    #[test]
    fn interface_inheritance_skips_constructors_and_shadowed_members() {
        let model = normalize_idl(
            r#"
            interface Base {
              constructor();
              undefined ping();
              undefined shared();
              readonly attribute long id;
            };
            interface Derived : Base { undefined shared(DOMString s); };
            "#,
        )
        .unwrap();
        let derived = &model.interfaces["Derived"];
        assert_eq!(member_names(derived), ["shared", "ping", "id"]);
        assert!(derived.constructors().is_empty());
        assert_eq!(derived.overload_sets()["shared"].len(), 1);
    }

    #[test]
    fn missing_dictionary_ancestor_is_fatal() {
        match normalize_idl("dictionary D : Missing { long x; };") {
            Err(CompilerError::UnresolvedAncestor { kind, name, ancestor }) => {
                assert_eq!(kind, DefinitionKind::Dictionary);
                assert_eq!(name, "D");
                assert_eq!(ancestor, "Missing");
            }
            other => panic!("expected UnresolvedAncestor, got {:?}", other),
        }
    }

    #[test]
    fn inheritance_cycles_are_fatal() {
        match normalize_idl("dictionary A : B { }; dictionary B : A { };") {
            Err(CompilerError::InheritanceCycle { cycle, .. }) => {
                assert_eq!(cycle, ["A", "B", "A"]);
            }
            other => panic!("expected InheritanceCycle, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_includes_name_the_missing_side() {
        match normalize_idl("interface A { }; A includes M;") {
            Err(CompilerError::UnresolvedInclude { missing, .. }) => assert_eq!(missing, "M"),
            other => panic!("expected UnresolvedInclude, got {:?}", other),
        }
        match normalize_idl("interface mixin M { }; B includes M;") {
            Err(CompilerError::UnresolvedInclude { missing, .. }) => assert_eq!(missing, "B"),
            other => panic!("expected UnresolvedInclude, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        assert!(matches!(
            normalize_idl("interface A { }; dictionary A { };"),
            Err(CompilerError::DuplicateDefinition { name }) if name == "A"
        ));
    }

    #[test]
    fn enum_values_are_deduplicated_and_checked() {
        let model = normalize_idl(r#"enum E { "a-b", "a-b", "" };"#).unwrap();
        let idents: Vec<&str> = model.enums["E"].values.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, ["A_b", "_empty"]);

        assert!(matches!(
            normalize_idl(r#"enum E { "a-b", "a.b" };"#),
            Err(CompilerError::EnumIdentifierCollision { identifier, .. }) if identifier == "A_b"
        ));
    }

    #[test]
    fn include_order_does_not_change_members() {
        let first = normalize_idl(
            r#"
            A includes M;
            interface A { undefined foo(); };
            enum E { "x" };
            interface mixin M { undefined baz(); };
            "#,
        )
        .unwrap();
        let second = normalize_idl(
            r#"
            interface A { undefined foo(); };
            enum E { "x" };
            interface mixin M { undefined baz(); };
            A includes M;
            "#,
        )
        .unwrap();
        assert_eq!(first.interfaces["A"], second.interfaces["A"]);
    }
}

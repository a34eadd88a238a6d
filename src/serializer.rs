//! Conversion from the schema node model back to JSON.
//!
//! Keywords are emitted in a fixed canonical order, so two equal models always
//! produce identical text:
//!
//! 1. `$schema`, `$id`, `$anchor`, `$dynamicAnchor`, `$ref`, `type`
//! 2. metadata: `title`, `description`, `default`, `examples`, `deprecated`,
//!    `readOnly`, `writeOnly`
//! 3. `enum`, `const`
//! 4. the keyword groups (object, array, string, numeric)
//! 5. combinators, then `$comment`, preserved keywords, and `$defs` last
//!
//! Flags that are `false` and empty collections are omitted.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::{
    ArrayKeywords, Combinators, CommonKeywords, InstanceType, NodeKind, NumericKeywords,
    ObjectKeywords, Schema, SchemaNode, StringKeywords,
};
use crate::value::{Map, Value};

/// Serializes a schema to a JSON value.
pub fn to_value(schema: &Schema) -> Value {
    match schema {
        Schema::Bool(b) => Value::Bool(*b),
        Schema::Node(node) => Value::Object(node_to_map(node)),
    }
}

fn node_to_map(node: &SchemaNode) -> Map {
    let mut out = Map::new();
    let common = &node.common;

    put_str(&mut out, "$schema", &common.schema_uri);
    put_str(&mut out, "$id", &common.id);
    put_str(&mut out, "$anchor", &common.anchor);
    put_str(&mut out, "$dynamicAnchor", &common.dynamic_anchor);
    put_str(&mut out, "$ref", &common.reference);

    if let Some(t) = type_keyword(&node.kind) {
        out.insert("type".to_string(), t);
    }

    metadata(&mut out, common);

    match &node.kind {
        NodeKind::Object(k) => object(&mut out, k),
        NodeKind::Array(k) => array(&mut out, k),
        NodeKind::String(k) => string(&mut out, k),
        NodeKind::Integer(k) | NodeKind::Number(k) => numeric(&mut out, k),
        NodeKind::Boolean | NodeKind::Null => {}
        NodeKind::Any(any) => {
            object(&mut out, &any.object);
            array(&mut out, &any.array);
            string(&mut out, &any.string);
            numeric(&mut out, &any.numeric);
        }
    }

    combinators(&mut out, &node.combinators);

    put_str(&mut out, "$comment", &common.comment);
    for (key, value) in common.extra.iter().chain(common.unsupported.iter()) {
        out.insert(key.clone(), value.clone());
    }
    put_schema_map(&mut out, "$defs", &common.defs);

    out
}

fn type_keyword(kind: &NodeKind) -> Option<Value> {
    let name = |t: &InstanceType| Value::String(t.as_str().to_string());
    match kind {
        NodeKind::Any(any) => match any.types.as_slice() {
            [] => None,
            [single] => Some(name(single)),
            several => Some(Value::Array(several.iter().map(name).collect())),
        },
        other => other.declared_type().as_ref().map(name),
    }
}

fn metadata(out: &mut Map, common: &CommonKeywords) {
    put_str(out, "title", &common.title);
    put_str(out, "description", &common.description);
    if let Some(default) = &common.default {
        out.insert("default".to_string(), default.clone());
    }
    if let Some(examples) = &common.examples {
        out.insert("examples".to_string(), Value::Array(examples.clone()));
    }
    put_flag(out, "deprecated", common.deprecated);
    put_flag(out, "readOnly", common.read_only);
    put_flag(out, "writeOnly", common.write_only);
    if let Some(values) = &common.enum_values {
        out.insert("enum".to_string(), Value::Array(values.clone()));
    }
    if let Some(value) = &common.const_value {
        out.insert("const".to_string(), value.clone());
    }
}

fn object(out: &mut Map, k: &ObjectKeywords) {
    put_schema_map(out, "properties", &k.properties);
    if !k.pattern_properties.is_empty() {
        let map = k
            .pattern_properties
            .iter()
            .map(|p| (p.pattern.as_str().to_string(), to_value(&p.schema)))
            .collect();
        out.insert("patternProperties".to_string(), Value::Object(map));
    }
    put_schema(out, "additionalProperties", &k.additional_properties);
    if !k.required.is_empty() {
        out.insert("required".to_string(), strings(k.required.iter()));
    }
    put_schema(out, "propertyNames", &k.property_names);
    put_count(out, "minProperties", k.min_properties);
    put_count(out, "maxProperties", k.max_properties);
    if !k.dependent_required.is_empty() {
        let map = k
            .dependent_required
            .iter()
            .map(|(trigger, names)| (trigger.clone(), strings(names.iter())))
            .collect();
        out.insert("dependentRequired".to_string(), Value::Object(map));
    }
    put_schema_map(out, "dependentSchemas", &k.dependent_schemas);
}

fn array(out: &mut Map, k: &ArrayKeywords) {
    if !k.prefix_items.is_empty() {
        out.insert(
            "prefixItems".to_string(),
            Value::Array(k.prefix_items.iter().map(|s| to_value(s)).collect()),
        );
    }
    put_schema(out, "items", &k.items);
    put_schema(out, "contains", &k.contains);
    put_count(out, "minContains", k.min_contains);
    put_count(out, "maxContains", k.max_contains);
    put_count(out, "minItems", k.min_items);
    put_count(out, "maxItems", k.max_items);
    put_flag(out, "uniqueItems", k.unique_items);
}

fn string(out: &mut Map, k: &StringKeywords) {
    put_count(out, "minLength", k.min_length);
    put_count(out, "maxLength", k.max_length);
    if let Some(pattern) = &k.pattern {
        out.insert(
            "pattern".to_string(),
            Value::String(pattern.as_str().to_string()),
        );
    }
    put_str(out, "format", &k.format);
}

fn numeric(out: &mut Map, k: &NumericKeywords) {
    let bounds = [
        ("minimum", &k.minimum),
        ("maximum", &k.maximum),
        ("exclusiveMinimum", &k.exclusive_minimum),
        ("exclusiveMaximum", &k.exclusive_maximum),
        ("multipleOf", &k.multiple_of),
    ];
    for (keyword, value) in bounds {
        if let Some(n) = value {
            out.insert(keyword.to_string(), Value::Number(*n));
        }
    }
}

fn combinators(out: &mut Map, c: &Combinators) {
    put_schema_list(out, "allOf", &c.all_of);
    put_schema_list(out, "anyOf", &c.any_of);
    put_schema_list(out, "oneOf", &c.one_of);
    put_schema(out, "not", &c.not);
    put_schema(out, "if", &c.if_schema);
    put_schema(out, "then", &c.then_schema);
    put_schema(out, "else", &c.else_schema);
}

fn put_str(out: &mut Map, keyword: &str, value: &Option<String>) {
    if let Some(s) = value {
        out.insert(keyword.to_string(), Value::String(s.clone()));
    }
}

fn put_flag(out: &mut Map, keyword: &str, set: bool) {
    if set {
        out.insert(keyword.to_string(), Value::Bool(true));
    }
}

fn put_count(out: &mut Map, keyword: &str, value: Option<u64>) {
    if let Some(n) = value {
        out.insert(keyword.to_string(), Value::Number(n.into()));
    }
}

fn put_schema(out: &mut Map, keyword: &str, schema: &Option<Arc<Schema>>) {
    if let Some(s) = schema {
        out.insert(keyword.to_string(), to_value(s));
    }
}

fn put_schema_list(out: &mut Map, keyword: &str, schemas: &[Arc<Schema>]) {
    if !schemas.is_empty() {
        out.insert(
            keyword.to_string(),
            Value::Array(schemas.iter().map(|s| to_value(s)).collect()),
        );
    }
}

fn put_schema_map(out: &mut Map, keyword: &str, schemas: &IndexMap<String, Arc<Schema>>) {
    if !schemas.is_empty() {
        let map = schemas
            .iter()
            .map(|(name, s)| (name.clone(), to_value(s)))
            .collect();
        out.insert(keyword.to_string(), Value::Object(map));
    }
}

fn strings<'a>(names: impl Iterator<Item = &'a String>) -> Value {
    Value::Array(names.map(|n| Value::String(n.clone())).collect())
}

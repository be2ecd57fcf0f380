//! Self-description methods appended to every method table.
//!
//! `listMethods`, `listSources` and `getAdvancedMethodsData` report on the
//! table they are attached to, as it was before they were added. They are
//! wrapped like any other composed adapter.

use std::sync::Arc;

use scriptbind_core::{
    ClassRef, MethodSignature, NativeError, NativeType, NativeValue, ParamSpec, ReturnType,
    ScriptTable, ScriptValue, SharedConverter, converter_class,
};

use crate::adapter::{AdapterDefinition, AdapterKind, MethodSpec};
use crate::env::keys;
use crate::executor::MethodExecutor;

pub const LIST_METHODS: &str = "listMethods";
pub const LIST_SOURCES: &str = "listSources";
pub const ADVANCED_METHODS_DATA: &str = "getAdvancedMethodsData";

/// Names the lister adds to a table.
pub const NAMES: [&str; 3] = [LIST_METHODS, LIST_SOURCES, ADVANCED_METHODS_DATA];

/// Composed adapter describing `methods` (exposed name → executor) and `sources`.
pub(crate) fn definition(
    target: &ClassRef,
    methods: &[(String, Arc<MethodExecutor>)],
    sources: &[String],
) -> AdapterDefinition {
    let listing: Arc<str> = methods
        .iter()
        .map(|(name, executor)| format!("{name}{}", executor.declaration().signature()))
        .collect::<Vec<_>>()
        .join(", ")
        .into();

    let source_entries: Arc<[(NativeValue, NativeValue)]> = sources
        .iter()
        .map(|source| (NativeValue::String(source.clone()), NativeValue::Bool(true)))
        .collect();

    let mut advanced = ScriptTable::new();
    for (name, executor) in methods {
        advanced.insert(name.as_str(), executor.declaration().describe());
    }
    let advanced = Arc::new(ScriptValue::Table(advanced));

    AdapterDefinition::new("MethodsLister", target, AdapterKind::Composed)
        .asynchronous()
        .method(MethodSpec::new(
            MethodSignature::new(LIST_METHODS)
                .description("List all the methods available")
                .returns(NativeType::String)
                .return_type(ReturnType::String),
            move |_| Ok(NativeValue::String(listing.to_string())),
        ))
        .method(MethodSpec::new(
            MethodSignature::new(LIST_SOURCES)
                .description("List all method sources")
                .returns(NativeType::map(NativeType::String, NativeType::Bool))
                .return_type(ReturnType::Table),
            move |_| Ok(NativeValue::Map(source_entries.to_vec())),
        ))
        .method(MethodSpec::new(
            MethodSignature::new(ADVANCED_METHODS_DATA)
                .description("Get a complete table of information about all available methods")
                .param(ParamSpec::env(keys::CONVERTER, NativeType::class(&converter_class())))
                .returns(NativeType::map(NativeType::String, NativeType::Any))
                .return_type(ReturnType::Table),
            move |args| {
                let converter = args.object::<SharedConverter>(0)?;
                converter
                    .to_native(&advanced, &NativeType::Any)
                    .ok_or_else(|| NativeError::failed("method descriptions are not convertible"))
            },
        ))
}

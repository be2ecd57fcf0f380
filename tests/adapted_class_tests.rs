// tests/adapted_class_tests.rs
//! Method tables built from several adapters: inheritance, aliases,
//! properties, name clashes and the self-description helpers.

use parking_lot::Mutex;
use scriptbind::prelude::*;

struct Machine {
    energy: Mutex<f64>,
}

impl Machine {
    fn new(energy: f64) -> Self {
        Self {
            energy: Mutex::new(energy),
        }
    }
}

fn machine() -> ClassRef {
    ClassRef::new("Machine")
}

fn grinder() -> ClassRef {
    ClassRef::new("Grinder").extends(&machine())
}

fn energy_getter(target: &ClassRef) -> MethodSpec {
    MethodSpec::new(
        MethodSignature::new("getEnergy")
            .param(ParamSpec::positional(NativeType::class(target)))
            .returns(NativeType::Float)
            .return_type(ReturnType::Number)
            .alias("energy"),
        |args| Ok((*args.target::<Machine>()?.energy.lock()).into_native()),
    )
}

fn machine_adapter() -> AdapterDefinition {
    AdapterDefinition::new("MachineAdapter", &machine(), AdapterKind::Peripheral)
        .source("machine")
        .method(energy_getter(&machine()))
}

fn grinder_adapter() -> AdapterDefinition {
    AdapterDefinition::new("GrinderAdapter", &grinder(), AdapterKind::Peripheral)
        .source("grinder")
        .method(MethodSpec::new(
            MethodSignature::new("grind")
                .param(ParamSpec::positional(NativeType::class(&grinder())))
                .param(ParamSpec::arg("cost", NativeType::Float))
                .returns(NativeType::Bool)
                .return_type(ReturnType::Boolean),
            |args| {
                let cost: f64 = args.arg(1)?;
                let mut energy = args.target::<Machine>()?.energy.lock();
                if *energy < cost {
                    return Ok(false.into_native());
                }
                *energy -= cost;
                Ok(true.into_native())
            },
        ))
}

fn speed_property() -> AdapterDefinition {
    AdapterDefinition::new("GrinderProps", &grinder(), AdapterKind::Property)
        .source("grinder-props")
        .property(PropertySpec::field("speed", NativeType::Int, |_| Ok(3i64.into_native())))
}

fn host() -> ScriptHost {
    let mut host = ScriptHost::new(AdapterContext::new());
    host.register(&machine_adapter()).unwrap();
    host.register(&grinder_adapter()).unwrap();
    host.register(&speed_property()).unwrap();
    host
}

// =============================================================================
// Table layout
// =============================================================================

#[test]
fn test_subclass_sees_inherited_methods() {
    let host = host();
    let object = NativeObject::new(grinder(), Machine::new(10.0));
    let table = host.method_table(&object, architectures::COMPUTERCRAFT).unwrap();

    assert_eq!(
        table.method_names(),
        [
            "grind",
            "getSpeed",
            "getEnergy",
            "energy",
            "listMethods",
            "listSources",
            "getAdvancedMethodsData"
        ]
    );
    assert_eq!(table.sources(), ["grinder", "grinder-props", "machine"]);
}

#[test]
fn test_base_class_does_not_see_subclass_methods() {
    let host = host();
    let object = NativeObject::new(machine(), Machine::new(10.0));
    let table = host.method_table(&object, architectures::COMPUTERCRAFT).unwrap();
    assert!(table.find("grind").is_none());
    assert!(table.find("energy").is_some());
}

#[test]
fn test_calls_through_inherited_and_own_methods() {
    let host = host();
    let object = NativeObject::new(grinder(), Machine::new(10.0));
    let call = |name: &str, args: &[ScriptValue]| {
        host.call(&object, architectures::OPENCOMPUTERS, name, args).unwrap()
    };

    assert_eq!(call("grind", &[ScriptValue::Number(4.0)]), vec![ScriptValue::Boolean(true)]);
    assert_eq!(call("grind", &[ScriptValue::Number(7.0)]), vec![ScriptValue::Boolean(false)]);
    assert_eq!(call("energy", &[]), vec![ScriptValue::Number(6.0)]);
    assert_eq!(call("getSpeed", &[]), vec![ScriptValue::Number(3.0)]);
}

#[test]
fn test_call_by_index_matches_names() {
    let host = host();
    let object = NativeObject::new(grinder(), Machine::new(2.5));
    let table = host.method_table(&object, architectures::COMPUTERCRAFT).unwrap();
    let env = host.env(architectures::COMPUTERCRAFT).unwrap();
    let target = NativeValue::Object(object.clone());

    let index = table.index_of("getEnergy").unwrap();
    assert_eq!(
        table.call_method(index, &env, &target, &[]).unwrap(),
        vec![ScriptValue::Number(2.5)]
    );
    assert!(table.call_method(99, &env, &target, &[]).is_err());
}

// =============================================================================
// Clashes
// =============================================================================

#[test]
fn test_duplicate_name_across_adapters() {
    let mut host = host();
    host.register(
        &AdapterDefinition::new("OtherAdapter", &grinder(), AdapterKind::Peripheral)
            .method(energy_getter(&grinder())),
    )
    .unwrap();

    let object = NativeObject::new(grinder(), Machine::new(1.0));
    let err = host.method_table(&object, architectures::COMPUTERCRAFT).unwrap_err();
    assert!(matches!(
        err,
        HostError::Adapter(AdapterError::Registration(RegistrationError::DuplicateMethod { ref name, .. }))
            if name == "getEnergy"
    ));

    // The base class is unaffected.
    let base = NativeObject::new(machine(), Machine::new(1.0));
    assert!(host.method_table(&base, architectures::COMPUTERCRAFT).is_ok());
}

#[test]
fn test_method_named_like_lister_clashes() {
    let mut host = ScriptHost::new(AdapterContext::new());
    host.register(
        &AdapterDefinition::new("Sneaky", &machine(), AdapterKind::Peripheral).method(MethodSpec::new(
            MethodSignature::new("listMethods").param(ParamSpec::positional(NativeType::class(&machine()))),
            |_| Ok(NativeValue::Null),
        )),
    )
    .unwrap();
    let object = NativeObject::new(machine(), Machine::new(0.0));
    assert!(host.method_table(&object, architectures::COMPUTERCRAFT).is_err());
}

// =============================================================================
// Self description
// =============================================================================

#[test]
fn test_list_methods_includes_aliases_and_signatures() {
    let host = host();
    let object = NativeObject::new(grinder(), Machine::new(0.0));
    let listing = host
        .call(&object, architectures::COMPUTERCRAFT, "listMethods", &[])
        .unwrap();
    assert_eq!(
        listing,
        vec![ScriptValue::from("grind(cost), getSpeed(), getEnergy(), energy()")]
    );
}

#[test]
fn test_advanced_methods_data() {
    let host = host();
    let object = NativeObject::new(grinder(), Machine::new(0.0));
    let data = host
        .call(&object, architectures::COMPUTERCRAFT, "getAdvancedMethodsData", &[])
        .unwrap();
    let [ScriptValue::Table(data)] = data.as_slice() else {
        panic!("expected one table, got {data:?}");
    };
    assert_eq!(data.len(), 4);

    let grind = data.get_str("grind").and_then(ScriptValue::as_table).unwrap();
    assert_eq!(grind.get_str("source"), Some(&ScriptValue::from("grinder")));
    let args = grind.get_str("args").and_then(ScriptValue::as_table).unwrap();
    let cost = args.sequence().unwrap()[0].as_table().unwrap();
    assert_eq!(cost.get_str("name"), Some(&ScriptValue::from("cost")));
    assert_eq!(cost.get_str("type"), Some(&ScriptValue::from("number")));

    let speed = data.get_str("getSpeed").and_then(ScriptValue::as_table).unwrap();
    assert_eq!(
        speed.get_str("description"),
        Some(&ScriptValue::from("Get the value of property speed"))
    );
}

#[test]
fn test_lister_can_be_disabled() {
    let mut host = ScriptHost::new(AdapterContext::new().with_method_lister(false));
    host.register(&machine_adapter()).unwrap();
    let object = NativeObject::new(machine(), Machine::new(0.0));
    let table = host.method_table(&object, architectures::COMPUTERCRAFT).unwrap();
    assert_eq!(table.method_names(), ["getEnergy", "energy"]);
}

// =============================================================================
// Revalidation
// =============================================================================

#[test]
fn test_revalidate_against_narrower_environment() {
    let mut host = ScriptHost::new(AdapterContext::new());
    host.register(
        &AdapterDefinition::new("Remote", &machine(), AdapterKind::Peripheral).method(MethodSpec::new(
            MethodSignature::new("whoCalls")
                .param(ParamSpec::positional(NativeType::class(&machine())))
                .param(ParamSpec::env(keys::COMPUTER, NativeType::String)),
            |_| Ok(NativeValue::Null),
        )),
    )
    .unwrap_err();

    let ctx = AdapterContext::new().with_env_type(AdapterKind::Peripheral, keys::COMPUTER, NativeType::String);
    let mut host = ScriptHost::new(ctx);
    host.register(
        &AdapterDefinition::new("Remote", &machine(), AdapterKind::Peripheral).method(MethodSpec::new(
            MethodSignature::new("whoCalls")
                .param(ParamSpec::positional(NativeType::class(&machine())))
                .param(ParamSpec::env(keys::COMPUTER, NativeType::String)),
            |_| Ok(NativeValue::Null),
        )),
    )
    .unwrap();
    host.registry().revalidate(host.context()).unwrap();
    assert!(host.registry().revalidate(&AdapterContext::new()).is_err());
}

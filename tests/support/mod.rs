#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tagdispatch::{
    Capability, DiscriminantValue, DispatchResult, FieldKey, Implementation, ImplementationBase,
    Record, Registry, Supports,
};

pub const TYPE_FIELD: &str = "type";
pub const KIND_FIELD: &str = "kind";

pub const CIRCLE: i64 = 1;
pub const SQUARE: i64 = 2;

/// Route `tracing` output through the test harness once per binary.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

/// Counts warn-level events seen by the current thread's subscriber.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `body` with a scoped subscriber and return how many warnings it logged.
pub fn count_warnings<T>(body: impl FnOnce() -> T) -> (T, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let out = tracing::subscriber::with_default(subscriber, body);
    (out, count.load(Ordering::SeqCst))
}

pub fn isolated_registry() -> Arc<Registry> {
    init_logging();
    Arc::new(Registry::new())
}

pub fn record(value: Value) -> Arc<Value> {
    Arc::new(value)
}

pub trait Listable {
    fn list(&self) -> Vec<Value>;
}

pub trait Printable {
    fn print(&self) -> String;
}

pub trait Drawable {
    fn draw(&self) -> String;
}

pub fn listable() -> Capability<Value, dyn Listable> {
    Capability::define("listable", TYPE_FIELD)
}

pub fn printable() -> Capability<Value, dyn Printable> {
    Capability::define("printable", TYPE_FIELD)
}

pub fn drawable() -> Capability<Shape, dyn Drawable> {
    Capability::define("drawable", KIND_FIELD)
}

// Capability-facing wrappers, the way call sites consume a capability.

pub fn list(
    cap: &Capability<Value, dyn Listable>,
    registry: &Registry,
    record: &Arc<Value>,
) -> DispatchResult<Vec<Value>> {
    cap.dispatch_in(registry, record, |ops| ops.list())
}

pub fn print(
    cap: &Capability<Value, dyn Printable>,
    registry: &Registry,
    record: &Arc<Value>,
) -> DispatchResult<String> {
    cap.dispatch_in(registry, record, |ops| ops.print())
}

pub fn draw(
    cap: &Capability<Shape, dyn Drawable>,
    registry: &Registry,
    shape: &Arc<Shape>,
) -> DispatchResult<String> {
    cap.dispatch_in(registry, shape, |ops| ops.draw())
}

/// `{type: "array-obj", ary: [...]}`
pub struct ArrayObj(ImplementationBase<Value>);

impl ArrayObj {
    fn items(&self) -> Vec<Value> {
        self.0.record()["ary"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }
}

impl Listable for ArrayObj {
    fn list(&self) -> Vec<Value> {
        self.items()
    }
}

impl Printable for ArrayObj {
    fn print(&self) -> String {
        let parts: Vec<String> = self.items().iter().map(Value::to_string).collect();
        format!("[{}]", parts.join(", "))
    }
}

impl Implementation<Value, dyn Listable> for ArrayObj {
    fn discriminant() -> Option<DiscriminantValue> {
        Some("array-obj".into())
    }

    fn build(base: ImplementationBase<Value>) -> Box<dyn Listable> {
        Box::new(ArrayObj(base))
    }
}

impl Implementation<Value, dyn Printable> for ArrayObj {
    fn discriminant() -> Option<DiscriminantValue> {
        Some("array-obj".into())
    }

    fn build(base: ImplementationBase<Value>) -> Box<dyn Printable> {
        Box::new(ArrayObj(base))
    }
}

/// `{type: "record-obj", rec: {...}}`, listed as `[key, value]` pairs.
///
/// Pairs follow the map's iteration order, which is insertion order since
/// tests build `serde_json` with `preserve_order`.
pub struct RecordObj(ImplementationBase<Value>);

impl Listable for RecordObj {
    fn list(&self) -> Vec<Value> {
        self.0.record()["rec"]
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(key, value)| Value::Array(vec![Value::from(key.as_str()), value.clone()]))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Implementation<Value, dyn Listable> for RecordObj {
    fn discriminant() -> Option<DiscriminantValue> {
        Some("record-obj".into())
    }

    fn build(base: ImplementationBase<Value>) -> Box<dyn Listable> {
        Box::new(RecordObj(base))
    }
}

/// Implementation that forgot to declare its tag.
pub struct Untagged;

impl Listable for Untagged {
    fn list(&self) -> Vec<Value> {
        Vec::new()
    }
}

impl Implementation<Value, dyn Listable> for Untagged {
    fn build(_base: ImplementationBase<Value>) -> Box<dyn Listable> {
        Box::new(Untagged)
    }
}

pub fn register_listables(
    cap: &Capability<Value, dyn Listable>,
    registry: &Arc<Registry>,
) -> DispatchResult<()> {
    let registrar = cap.registrar_in(registry);
    registrar.register_impl::<ArrayObj>()?;
    registrar.register_impl::<RecordObj>()?;
    Ok(())
}

/// Typed record with an integer tag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shape {
    pub kind: i64,
    pub size: f64,
}

impl Record for Shape {
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue> {
        match field.as_name().as_str() {
            KIND_FIELD => Some(DiscriminantValue::Int(self.kind)),
            _ => None,
        }
    }
}

impl Supports<dyn Drawable> for Shape {}

pub struct Circle(ImplementationBase<Shape>);

impl Drawable for Circle {
    fn draw(&self) -> String {
        format!("circle r={}", self.0.record().size)
    }
}

impl Implementation<Shape, dyn Drawable> for Circle {
    fn discriminant() -> Option<DiscriminantValue> {
        Some(DiscriminantValue::Int(CIRCLE))
    }

    fn build(base: ImplementationBase<Shape>) -> Box<dyn Drawable> {
        Box::new(Circle(base))
    }
}

pub struct Square(ImplementationBase<Shape>);

impl Drawable for Square {
    fn draw(&self) -> String {
        format!("square side={}", self.0.record().size)
    }
}

impl Implementation<Shape, dyn Drawable> for Square {
    fn discriminant() -> Option<DiscriminantValue> {
        Some(DiscriminantValue::Int(SQUARE))
    }

    fn build(base: ImplementationBase<Shape>) -> Box<dyn Drawable> {
        Box::new(Square(base))
    }
}

//! Test doubles for the interop layer: a scripted [`MockEngine`] recording
//! every ABI call, plus canned payloads.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use plotspan_interop::abi::{AbiResult, EngineAbi, ExceptionPtr, RawPtr, TypeId};
use plotspan_interop::data::Cell;
use plotspan_interop::slot::SlotId;
use plotspan_interop::DataPayload;

/// One recorded ABI call, in invocation order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateChart,
    CreateCanvas,
    ObjectFree(u32),
    PointerDown { chart: u32, canvas: u32, id: i32, x: f64, y: f64 },
    PointerUp { chart: u32, canvas: u32, id: i32, x: f64, y: f64 },
    PointerMove { chart: u32, canvas: u32, id: i32, x: f64, y: f64 },
    PointerLeave { chart: u32, canvas: u32, id: i32 },
    Wheel { chart: u32, canvas: u32, delta: f64 },
    ChartStore(u32),
    ChartRestore { chart: u32, snapshot: u32 },
    AnimStore(u32),
    AnimRestore { chart: u32, anim: u32 },
    SetValue { chart: u32, path: String, value: String },
    GetValue { chart: u32, path: String },
    StyleSet { chart: u32, path: String, value: String },
    StyleGet { chart: u32, path: String, computed: bool },
    AnimSetValue { chart: u32, path: String, value: String },
    AddDimension { chart: u32, name: String, categories: Vec<String> },
    AddMeasure { chart: u32, name: String, unit: String, values: Vec<f64> },
    AddRecord { chart: u32, cells: Vec<Cell> },
    SetKeyframe(u32),
    Animate { chart: u32, slot: u32 },
    AddEventListener { chart: u32, name: String, slot: u32 },
    RemoveEventListener { chart: u32, name: String, slot: u32 },
    PreventDefault(u32),
    Version,
    SetLogging(bool),
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    next_ptr: u32,
    fail_next: Option<(u32, String)>,
    exceptions: HashMap<u32, (u32, String)>,
    listeners: Vec<(u32, String, u32)>,
    props: HashMap<(u32, String), String>,
}

impl MockState {
    fn alloc(&mut self) -> RawPtr {
        self.next_ptr += 1;
        RawPtr(0x1000 + self.next_ptr)
    }

    fn take_failure(&mut self) -> Option<ExceptionPtr> {
        let (type_id, message) = self.fail_next.take()?;
        let ptr = self.alloc();
        self.exceptions.insert(ptr.0, (type_id, message));
        Some(ExceptionPtr(ptr))
    }
}

/// Scripted engine double. Cloning shares the underlying state so a test can
/// keep a handle for inspection after boxing one clone into the bridge.
/// Single-threaded by design, like the real calling convention.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Rc<RefCell<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn EngineAbi> {
        Box::new(self.clone())
    }

    /// Script the next fallible entry point to raise an exception with the
    /// given type discriminator and message.
    pub fn fail_next(&self, type_id: u32, message: &str) {
        self.state.borrow_mut().fail_next = Some((type_id, message.to_owned()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.state.borrow().calls.last().cloned()
    }

    pub fn calls_matching(&self, pred: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| pred(c))
            .cloned()
            .collect()
    }

    /// Currently bound (chart, event name, slot) listener triples.
    pub fn listeners(&self) -> Vec<(u32, String, u32)> {
        self.state.borrow().listeners.clone()
    }

    pub fn set_prop(&self, chart: u32, path: &str, value: &str) {
        self.state
            .borrow_mut()
            .props
            .insert((chart, path.to_owned()), value.to_owned());
    }
}

macro_rules! fallible {
    ($self:ident, $record:expr, $ok:expr) => {{
        let mut state = $self.state.borrow_mut();
        state.calls.push($record);
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok($ok),
        }
    }};
}

impl EngineAbi for MockEngine {
    fn create_chart(&mut self) -> AbiResult<RawPtr> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CreateChart);
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok(state.alloc()),
        }
    }

    fn create_canvas(&mut self) -> AbiResult<RawPtr> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CreateCanvas);
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok(state.alloc()),
        }
    }

    fn object_free(&mut self, handle: RawPtr) -> AbiResult<()> {
        fallible!(self, Call::ObjectFree(handle.0), ())
    }

    fn pointer_down(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()> {
        fallible!(
            self,
            Call::PointerDown { chart: chart.0, canvas: canvas.0, id, x, y },
            ()
        )
    }

    fn pointer_up(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()> {
        fallible!(
            self,
            Call::PointerUp { chart: chart.0, canvas: canvas.0, id, x, y },
            ()
        )
    }

    fn pointer_move(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()> {
        fallible!(
            self,
            Call::PointerMove { chart: chart.0, canvas: canvas.0, id, x, y },
            ()
        )
    }

    fn pointer_leave(&mut self, chart: RawPtr, canvas: RawPtr, id: i32) -> AbiResult<()> {
        fallible!(
            self,
            Call::PointerLeave { chart: chart.0, canvas: canvas.0, id },
            ()
        )
    }

    fn wheel(&mut self, chart: RawPtr, canvas: RawPtr, delta: f64) -> AbiResult<()> {
        fallible!(self, Call::Wheel { chart: chart.0, canvas: canvas.0, delta }, ())
    }

    fn chart_store(&mut self, chart: RawPtr) -> AbiResult<RawPtr> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ChartStore(chart.0));
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok(state.alloc()),
        }
    }

    fn chart_restore(&mut self, chart: RawPtr, snapshot: RawPtr) -> AbiResult<()> {
        fallible!(
            self,
            Call::ChartRestore { chart: chart.0, snapshot: snapshot.0 },
            ()
        )
    }

    fn anim_store(&mut self, chart: RawPtr) -> AbiResult<RawPtr> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::AnimStore(chart.0));
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok(state.alloc()),
        }
    }

    fn anim_restore(&mut self, chart: RawPtr, anim: RawPtr) -> AbiResult<()> {
        fallible!(self, Call::AnimRestore { chart: chart.0, anim: anim.0 }, ())
    }

    fn chart_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::SetValue {
            chart: chart.0,
            path: path.to_owned(),
            value: value.to_owned(),
        });
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => {
                state
                    .props
                    .insert((chart.0, path.to_owned()), value.to_owned());
                Ok(())
            }
        }
    }

    fn chart_get_value(&mut self, chart: RawPtr, path: &str) -> AbiResult<String> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::GetValue {
            chart: chart.0,
            path: path.to_owned(),
        });
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => Ok(state
                .props
                .get(&(chart.0, path.to_owned()))
                .cloned()
                .unwrap_or_default()),
        }
    }

    fn style_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()> {
        fallible!(
            self,
            Call::StyleSet {
                chart: chart.0,
                path: path.to_owned(),
                value: value.to_owned(),
            },
            ()
        )
    }

    fn style_get_value(&mut self, chart: RawPtr, path: &str, computed: bool) -> AbiResult<String> {
        fallible!(
            self,
            Call::StyleGet {
                chart: chart.0,
                path: path.to_owned(),
                computed,
            },
            String::new()
        )
    }

    fn anim_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()> {
        fallible!(
            self,
            Call::AnimSetValue {
                chart: chart.0,
                path: path.to_owned(),
                value: value.to_owned(),
            },
            ()
        )
    }

    fn add_dimension(&mut self, chart: RawPtr, name: &str, categories: &[String]) -> AbiResult<()> {
        fallible!(
            self,
            Call::AddDimension {
                chart: chart.0,
                name: name.to_owned(),
                categories: categories.to_vec(),
            },
            ()
        )
    }

    fn add_measure(&mut self, chart: RawPtr, name: &str, unit: &str, values: &[f64])
        -> AbiResult<()> {
        fallible!(
            self,
            Call::AddMeasure {
                chart: chart.0,
                name: name.to_owned(),
                unit: unit.to_owned(),
                values: values.to_vec(),
            },
            ()
        )
    }

    fn add_record(&mut self, chart: RawPtr, cells: &[Cell]) -> AbiResult<()> {
        fallible!(
            self,
            Call::AddRecord {
                chart: chart.0,
                cells: cells.to_vec(),
            },
            ()
        )
    }

    fn set_keyframe(&mut self, chart: RawPtr) -> AbiResult<()> {
        fallible!(self, Call::SetKeyframe(chart.0), ())
    }

    fn animate(&mut self, chart: RawPtr, completion: SlotId) -> AbiResult<()> {
        fallible!(
            self,
            Call::Animate { chart: chart.0, slot: completion.0 },
            ()
        )
    }

    fn add_event_listener(&mut self, chart: RawPtr, name: &str, callback: SlotId) -> AbiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::AddEventListener {
            chart: chart.0,
            name: name.to_owned(),
            slot: callback.0,
        });
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => {
                state.listeners.push((chart.0, name.to_owned(), callback.0));
                Ok(())
            }
        }
    }

    fn remove_event_listener(
        &mut self,
        chart: RawPtr,
        name: &str,
        callback: SlotId,
    ) -> AbiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::RemoveEventListener {
            chart: chart.0,
            name: name.to_owned(),
            slot: callback.0,
        });
        match state.take_failure() {
            Some(ex) => Err(ex),
            None => {
                state
                    .listeners
                    .retain(|(c, n, s)| !(*c == chart.0 && n == name && *s == callback.0));
                Ok(())
            }
        }
    }

    fn event_prevent_default(&mut self, event: RawPtr) -> AbiResult<()> {
        fallible!(self, Call::PreventDefault(event.0), ())
    }

    fn exception_type(&self, exception: ExceptionPtr) -> TypeId {
        TypeId(
            self.state
                .borrow()
                .exceptions
                .get(&exception.0 .0)
                .map(|(t, _)| *t)
                .unwrap_or(0),
        )
    }

    fn error_message(&self, exception: ExceptionPtr, _type_id: TypeId) -> String {
        self.state
            .borrow()
            .exceptions
            .get(&exception.0 .0)
            .map(|(_, m)| m.clone())
            .unwrap_or_else(|| "unknown exception".to_owned())
    }

    fn version(&mut self) -> AbiResult<String> {
        fallible!(self, Call::Version, "0.1.0-mock".to_owned())
    }

    fn set_logging(&mut self, enabled: bool) -> AbiResult<()> {
        fallible!(self, Call::SetLogging(enabled), ())
    }
}

// ---- canned payloads ------------------------------------------------------

static CUBE_JSON: &str = r#"{
  "dimensions": [{ "name": "Year", "categories": ["2020", "2021"] }],
  "measures": [{ "name": "Sales", "values": [10, 20] }]
}"#;

static CONFLICT_JSON: &str = r#"{
  "records": [{ "Year": "2020", "Sales": 10 }],
  "dimensions": [{ "name": "Year", "categories": ["2020"] }],
  "measures": [{ "name": "Sales", "values": [10] }]
}"#;

static RECORDS_JSON: &str = r#"{
  "records": [
    { "Year": "2020", "Sales": 10.0 },
    { "Year": "2021", "Sales": 20.0 }
  ]
}"#;

static CUBE: Lazy<DataPayload> =
    Lazy::new(|| serde_json::from_str(CUBE_JSON).expect("cube fixture should parse"));
static CONFLICT: Lazy<DataPayload> =
    Lazy::new(|| serde_json::from_str(CONFLICT_JSON).expect("conflict fixture should parse"));
static RECORDS: Lazy<DataPayload> =
    Lazy::new(|| serde_json::from_str(RECORDS_JSON).expect("records fixture should parse"));

/// Cube payload matching the Year/Sales example used throughout the tests.
pub fn cube_payload() -> DataPayload {
    CUBE.clone()
}

/// Payload carrying both Set and Cube markers (must be rejected).
pub fn conflicting_payload() -> DataPayload {
    CONFLICT.clone()
}

/// Already-normalized record payload equivalent to [`cube_payload`].
pub fn records_payload() -> DataPayload {
    RECORDS.clone()
}

/// Parse an ad-hoc payload literal written inline in a test.
pub fn payload_from_json(raw: &str) -> anyhow::Result<DataPayload> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("payload fixture should parse: {e}"))
}

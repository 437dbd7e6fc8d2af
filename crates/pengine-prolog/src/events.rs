//! Decoding of text-encoded response bodies.
//!
//! A text response is a goal such as
//! `create('e1',[slave_limit(3),answer(success('e1',[a],[],0.01,false))])`.
//! It is evaluated with one native predicate per event kind; each native
//! records an [`Event`] instead of acting on it. `create/2` and `destroy/2`
//! run their nested goal in a fresh frame, and the events recorded there
//! become the nested chain of the outer event. Events recorded on a branch
//! that later fails are dropped again.

use pengine_core::{ErrorPayload, Event, EventKind, HostTerm, Operators};

use crate::{Bindings, Checkpoint, EvalError, Interpreter, TextDecodeError};

/// Events recorded while evaluating one response.
struct Trace {
    frames: Vec<Vec<Event<HostTerm>>>,
}

impl Trace {
    fn emit(&mut self, event: Event<HostTerm>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(event);
        }
    }
}

impl Checkpoint for Trace {
    fn checkpoint(&self) -> usize {
        self.frames.last().map_or(0, Vec::len)
    }

    fn rollback(&mut self, mark: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.truncate(mark);
        }
    }
}

/// Decodes text-encoded response bodies into events.
pub struct EventDecoder {
    interp: Interpreter<Trace>,
}

impl EventDecoder {
    /// Create a decoder reading terms with `ops`.
    #[must_use]
    pub fn new(ops: Operators) -> Self {
        let mut interp = Interpreter::new(ops);
        interp.register("success", 5, on_success);
        interp.register("failure", 2, on_failure);
        interp.register("error", 2, on_error);
        interp.register("create", 2, on_create);
        interp.register("destroy", 2, on_destroy);
        interp.register("destroy", 1, on_destroy);
        interp.register("output", 2, on_output);
        interp.register("prompt", 2, on_prompt);
        interp.register("stop", 1, on_stop);
        interp.register("died", 1, on_died);
        Self { interp }
    }

    /// Decode one response body.
    ///
    /// # Errors
    /// Returns error if the body does not parse, raises an error, fails, or
    /// records no event at all.
    pub fn decode(&self, body: &str) -> Result<Event<HostTerm>, TextDecodeError> {
        let goal = self.interp.parse(body)?;
        let mut trace = Trace {
            frames: vec![Vec::new()],
        };
        if self
            .interp
            .once(&mut trace, &goal, &Bindings::new())?
            .is_none()
        {
            return Err(TextDecodeError::Failed);
        }
        let events = trace.frames.pop().unwrap_or_default();
        Event::chain(events).ok_or(TextDecodeError::Empty)
    }
}

/// Decode one text-encoded response body using `ops`.
///
/// # Errors
/// See [`EventDecoder::decode`].
pub fn decode_event(body: &str, ops: &Operators) -> Result<Event<HostTerm>, TextDecodeError> {
    EventDecoder::new(ops.clone()).decode(body)
}

fn id_of(term: &HostTerm) -> String {
    term.as_atom()
        .map_or_else(|| term.to_string(), ToString::to_string)
}

fn time_of(term: &HostTerm) -> f64 {
    term.as_f64().unwrap_or_default()
}

/// Run `goal` in a fresh frame and return the chain it recorded, or `None`
/// if the goal failed.
fn nested(
    interp: &Interpreter<Trace>,
    trace: &mut Trace,
    goal: &HostTerm,
) -> Result<Option<Option<Event<HostTerm>>>, EvalError> {
    trace.frames.push(Vec::new());
    let solved = interp.once(trace, goal, &Bindings::new());
    let events = trace.frames.pop().unwrap_or_default();
    Ok(solved?.map(|_| Event::chain(events)))
}

fn on_success(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    let results = args[1]
        .list_items()
        .ok_or_else(|| EvalError::type_error("list", &args[1]))?
        .to_vec();
    let projection = args[2]
        .list_items()
        .unwrap_or_default()
        .iter()
        .map(id_of)
        .collect();
    let more = args[4]
        .as_atom()
        .ok_or_else(|| EvalError::type_error("atom", &args[4]))?
        == "true";
    trace.emit(Event::new(
        id_of(&args[0]),
        EventKind::Success {
            results,
            projection,
            time: time_of(&args[3]),
            more,
        },
    ));
    Ok(true)
}

fn on_failure(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(
        id_of(&args[0]),
        EventKind::Failure {
            time: time_of(&args[1]),
        },
    ));
    Ok(true)
}

fn on_error(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(
        id_of(&args[0]),
        EventKind::Error(ErrorPayload::Exception(args[1].clone())),
    ));
    Ok(true)
}

fn on_create(
    interp: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    let id = args[0]
        .as_atom()
        .ok_or_else(|| EvalError::type_error("atom", &args[0]))?;
    let options = args[1]
        .list_items()
        .ok_or_else(|| EvalError::type_error("list", &args[1]))?;

    let mut slave_limit = 0;
    let mut answer = None;
    for option in options {
        match (option.functor(), option.args()) {
            (Some(("slave_limit", 1)), [HostTerm::Integer(n)]) => slave_limit = *n,
            (Some(("answer", 1)), [goal]) if answer.is_none() => answer = Some(goal),
            _ => {}
        }
    }

    let mut event = Event::new(id, EventKind::Create { slave_limit });
    if let Some(goal) = answer {
        match nested(interp, trace, goal)? {
            Some(chain) => event.answer = chain.map(Box::new),
            None => return Ok(false),
        }
    }
    trace.emit(event);
    Ok(true)
}

fn on_destroy(
    interp: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    let mut event = Event::new(id_of(&args[0]), EventKind::Destroy);
    if let Some(goal) = args.get(1) {
        match nested(interp, trace, goal)? {
            Some(chain) => event.answer = chain.map(Box::new),
            None => return Ok(false),
        }
    }
    trace.emit(event);
    Ok(true)
}

fn on_output(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(
        id_of(&args[0]),
        EventKind::Output(args[1].clone()),
    ));
    Ok(true)
}

fn on_prompt(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(
        id_of(&args[0]),
        EventKind::Prompt(args[1].clone()),
    ));
    Ok(true)
}

fn on_stop(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(id_of(&args[0]), EventKind::Stop));
    Ok(true)
}

fn on_died(
    _: &Interpreter<Trace>,
    trace: &mut Trace,
    args: &[HostTerm],
) -> Result<bool, EvalError> {
    trace.emit(Event::new(id_of(&args[0]), EventKind::Died));
    Ok(true)
}

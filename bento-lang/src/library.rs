//! The built-in sentence library.
//!
//! A fixed dispatch table keyed by syntax. Built-in handlers run in the
//! caller's frame, so every slot they touch belongs to the calling function.

use std::io::Write;
use std::process::Command;

use crate::compiler::code::Slot;
use crate::number::{Number, UNLIMITED_PRECISION};
use crate::value::{Value, ValueKind};
use crate::vm::{RuntimeError, VirtualMachine};

/// Dispatch a syntax to its built-in handler. Returns `false` when the
/// syntax does not name a built-in, leaving the call to a user function.
pub(crate) fn call<W: Write>(
    vm: &mut VirtualMachine<W>,
    syntax: &str,
    args: &[Slot],
) -> Result<bool, RuntimeError> {
    match syntax {
        "set ? to ?" => {
            let [to, from] = arity(syntax, args)?;
            set(vm, to, from)?;
        }
        "add ? and ? into ?" => {
            let [a, b, into] = arity(syntax, args)?;
            let (a, b) = (vm.get_number(a)?, vm.get_number(b)?);
            let precision = destination_precision(vm, into)?;
            store_number(vm, into, Number::sum(&a, &b, precision))?;
        }
        "subtract ? from ? into ?" => {
            // "subtract a from b" stores b - a.
            let [a, b, into] = arity(syntax, args)?;
            let (a, b) = (vm.get_number(a)?, vm.get_number(b)?);
            let precision = destination_precision(vm, into)?;
            store_number(vm, into, Number::difference(&b, &a, precision))?;
        }
        "multiply ? and ? into ?" => {
            let [a, b, into] = arity(syntax, args)?;
            let (a, b) = (vm.get_number(a)?, vm.get_number(b)?);
            let precision = destination_precision(vm, into)?;
            store_number(vm, into, Number::product(&a, &b, precision))?;
        }
        "divide ? by ? into ?" => {
            let [a, b, into] = arity(syntax, args)?;
            let (a, b) = (vm.get_number(a)?, vm.get_number(b)?);
            let precision = destination_precision(vm, into)?;
            let quotient =
                Number::quotient(&a, &b, precision).ok_or(RuntimeError::DivisionByZero)?;
            store_number(vm, into, quotient)?;
        }
        "run system command ?" => {
            let [command] = arity(syntax, args)?;
            run_system_command(vm, command, None, None)?;
        }
        "run system command ? output into ?" => {
            let [command, output] = arity(syntax, args)?;
            run_system_command(vm, command, Some(output), None)?;
        }
        "run system command ? status code into ?" => {
            let [command, status] = arity(syntax, args)?;
            run_system_command(vm, command, None, Some(status))?;
        }
        "run system command ? output into ? status code into ?" => {
            let [command, output, status] = arity(syntax, args)?;
            run_system_command(vm, command, Some(output), Some(status))?;
        }
        _ if is_display(syntax) => display(vm, args)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// `display` is variadic: the bare verb, or the verb followed by any number
/// of placeholders.
fn is_display(syntax: &str) -> bool {
    let mut words = syntax.split(' ');
    words.next() == Some("display") && words.all(|word| word == "?")
}

/// Prints every argument back to back, then a single newline. The blackhole
/// prints nothing.
fn display<W: Write>(vm: &mut VirtualMachine<W>, args: &[Slot]) -> Result<(), RuntimeError> {
    for slot in args {
        if let Some(cell) = vm.get(*slot) {
            write!(vm.out, "{}", cell.borrow())?;
        }
    }
    writeln!(vm.out)?;
    Ok(())
}

/// Copies the source slot into the destination. Numbers are rounded to the
/// destination's precision; assigning across types fails.
fn set<W: Write>(vm: &mut VirtualMachine<W>, to: Slot, from: Slot) -> Result<(), RuntimeError> {
    let value = match vm.get(from) {
        Some(cell) => cell.borrow().clone(),
        // A blackhole source reads as the destination's zero/empty default.
        None => match vm.get(to) {
            Some(destination) => Value::default_of(destination.borrow().kind()),
            None => return Ok(()),
        },
    };
    store(vm, to, value)
}

/// Store a value into a slot with assignment semantics: numbers round to the
/// destination's precision, and the destination's type must match.
fn store<W: Write>(vm: &mut VirtualMachine<W>, slot: Slot, value: Value) -> Result<(), RuntimeError> {
    let Some(destination) = vm.get(slot) else {
        // Writes to the blackhole are discarded.
        return Ok(());
    };
    let converted = {
        let current = destination.borrow();
        match (&*current, &value) {
            (Value::Number(to), Value::Number(from)) => {
                Value::Number(from.rounded(to.precision()))
            }
            (Value::Text(_), Value::Text(from)) => Value::Text(from.clone()),
            (to, from) => {
                return Err(RuntimeError::CannotSet {
                    to: to.kind(),
                    from: from.kind(),
                })
            }
        }
    };
    vm.set(slot, converted);
    Ok(())
}

/// Store an arithmetic result without re-rounding it. Sums and differences
/// stay exact in storage; products and quotients were already rounded.
fn store_number<W: Write>(
    vm: &mut VirtualMachine<W>,
    slot: Slot,
    number: Number,
) -> Result<(), RuntimeError> {
    let Some(destination) = vm.get(slot) else {
        return Ok(());
    };
    {
        let current = destination.borrow();
        if current.kind() != ValueKind::Number {
            return Err(RuntimeError::WrongType {
                expected: ValueKind::Number,
                found: current.kind(),
            });
        }
    }
    vm.set(slot, Value::Number(number));
    Ok(())
}

/// The precision an arithmetic result is rounded to before it is stored.
fn destination_precision<W: Write>(
    vm: &VirtualMachine<W>,
    slot: Slot,
) -> Result<u32, RuntimeError> {
    Ok(vm.get_number(slot)?.precision())
}

/// Runs a shell command, blocking until it exits. The combined stdout and
/// stderr go to the machine's output unless captured into a slot.
fn run_system_command<W: Write>(
    vm: &mut VirtualMachine<W>,
    command: Slot,
    output_into: Option<Slot>,
    status_into: Option<Slot>,
) -> Result<(), RuntimeError> {
    let command = vm.get_text(command)?;
    log::debug!("run system command: {command}");
    let output = Command::new("sh").arg("-c").arg(&command).output()?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    match output_into {
        Some(slot) => store(vm, slot, Value::Text(combined))?,
        None => write!(vm.out, "{combined}")?,
    }

    if let Some(slot) = status_into {
        let code = output.status.code().unwrap_or(-1);
        store(
            vm,
            slot,
            Value::Number(Number::from_integer(code.into(), UNLIMITED_PRECISION)),
        )?;
    }

    Ok(())
}

fn arity<const N: usize>(syntax: &str, args: &[Slot]) -> Result<[Slot; N], RuntimeError> {
    args.try_into().map_err(|_| RuntimeError::WrongArity {
        syntax: syntax.to_string(),
        expected: N,
        got: args.len(),
    })
}

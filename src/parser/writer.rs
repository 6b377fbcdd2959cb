use std::fmt::Write as _;

use crate::error::ExportError;
use crate::parser::step::{encode_step_string, StepEntity, StepFile, StepValue};

/// Serializes a STEP file.
///
/// Unmodified entities are written from their original record text, so a
/// file that was only loaded comes back with the same entities. Every
/// reference is checked first; a reference to a missing entity fails the
/// write instead of producing a broken file.
pub fn write_step(file: &StepFile) -> Result<String, ExportError> {
    validate_references(file)?;

    let mut out = String::with_capacity(file.header.len() + file.len() * 64);
    out.push_str(&file.header);
    out.push_str("\nDATA;\n");

    for entity in file.entities() {
        match entity.raw() {
            Some(raw) => out.push_str(raw),
            None => write_entity(&mut out, entity)?,
        }
        out.push_str(";\n");
    }

    out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
    Ok(out)
}

fn validate_references(file: &StepFile) -> Result<(), ExportError> {
    for entity in file.entities() {
        let mut missing = None;
        entity.for_each_reference(&mut |target| {
            if missing.is_none() && file.get_entity(target).is_none() {
                missing = Some(target);
            }
        });
        if let Some(target) = missing {
            return Err(ExportError::DanglingReference {
                entity: entity.id,
                target,
            });
        }
    }
    Ok(())
}

fn write_entity(out: &mut String, entity: &StepEntity) -> Result<(), ExportError> {
    let _ = write!(out, "#{}={}(", entity.id, entity.entity_type);
    write_values(out, &entity.values, entity.id)?;
    out.push(')');
    Ok(())
}

fn write_values(out: &mut String, values: &[StepValue], id: u64) -> Result<(), ExportError> {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(out, value, id)?;
    }
    Ok(())
}

fn write_value(out: &mut String, value: &StepValue, id: u64) -> Result<(), ExportError> {
    match value {
        StepValue::String(s) => {
            out.push('\'');
            out.push_str(&encode_step_string(s));
            out.push('\'');
        }
        StepValue::Real(f) => out.push_str(&format_real(*f).ok_or_else(|| {
            ExportError::WriteError {
                message: format!("entity #{id} holds a non-finite number"),
            }
        })?),
        StepValue::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        StepValue::Boolean(b) => out.push_str(if *b { ".T." } else { ".F." }),
        StepValue::Enum(e) => {
            let _ = write!(out, ".{e}.");
        }
        StepValue::Reference(r) => {
            let _ = write!(out, "#{r}");
        }
        StepValue::Typed(name, inner) => {
            out.push_str(name);
            out.push('(');
            write_value(out, inner, id)?;
            out.push(')');
        }
        StepValue::List(items) => {
            out.push('(');
            write_values(out, items, id)?;
            out.push(')');
        }
        StepValue::Binary(b) => {
            let _ = write!(out, "\"{b}\"");
        }
        StepValue::Null => out.push('$'),
        StepValue::Derived => out.push('*'),
    }
    Ok(())
}

/// STEP reals always carry a decimal point: `700.`, `0.2`.
fn format_real(f: f64) -> Option<String> {
    if !f.is_finite() {
        return None;
    }
    let mut text = format!("{f}");
    if !text.contains('.') {
        text.push('.');
    }
    Some(text)
}

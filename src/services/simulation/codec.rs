// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Dynamic ABI encoding of entry-point calls against a loaded call schema,
//! and decoding of raw return data against an expected ordered type list.

use crate::domain::error::SimulationError;
use crate::domain::scenario::{Interaction, InteractionBatch};
use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, Bytes, I256, U256};
use alloy_json_abi::Function;

/// Selector + ABI-encoded arguments for `function`. Every argument is checked
/// against its canonical parameter type first so shape errors name the
/// offending parameter. Struct parameters take plain tuple values.
pub fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<Bytes, SimulationError> {
    if function.inputs.len() != args.len() {
        return Err(SimulationError::Encoding(format!(
            "{} expects {} arguments, got {}",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }
    for (idx, (param, arg)) in function.inputs.iter().zip(args).enumerate() {
        let canonical = param.selector_type();
        let ty = DynSolType::parse(&canonical).map_err(|e| {
            SimulationError::Encoding(format!(
                "{}: unresolvable type {canonical} for parameter {idx}: {e}",
                function.name
            ))
        })?;
        if !ty.matches(arg) {
            let name = if param.name.is_empty() {
                format!("#{idx}")
            } else {
                param.name.clone()
            };
            return Err(SimulationError::Encoding(format!(
                "{}: argument `{name}` does not match declared type {ty}",
                function.name
            )));
        }
    }
    let mut encoded = function.selector().to_vec();
    encoded.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
    Ok(Bytes::from(encoded))
}

/// Decode `raw` as the ordered parameter list `schema`.
pub fn decode_output(raw: &[u8], schema: &[DynSolType]) -> Result<Vec<DynSolValue>, SimulationError> {
    if schema.is_empty() {
        return Ok(Vec::new());
    }
    if raw.is_empty() || raw.len() % 32 != 0 {
        return Err(SimulationError::Decoding(format!(
            "return data of {} bytes is not a word-aligned encoding of {}",
            raw.len(),
            DynSolType::Tuple(schema.to_vec())
        )));
    }
    let decoded = DynSolType::Tuple(schema.to_vec())
        .abi_decode_params(raw)
        .map_err(|e| SimulationError::Decoding(e.to_string()))?;
    match decoded {
        DynSolValue::Tuple(values) if values.len() == schema.len() => Ok(values),
        other => Err(SimulationError::Decoding(format!(
            "expected {} values, decoded {other:?}",
            schema.len()
        ))),
    }
}

pub fn interaction_value(interaction: &Interaction) -> DynSolValue {
    DynSolValue::Tuple(vec![
        DynSolValue::Address(interaction.target),
        DynSolValue::Uint(interaction.value, 256),
        DynSolValue::Bytes(interaction.call_data.to_vec()),
    ])
}

pub fn phases_value<'a, I>(phases: I) -> DynSolValue
where
    I: IntoIterator<Item = &'a [Interaction]>,
{
    DynSolValue::FixedArray(
        phases
            .into_iter()
            .map(|phase| DynSolValue::Array(phase.iter().map(interaction_value).collect()))
            .collect(),
    )
}

pub fn batch_value(batch: &InteractionBatch) -> DynSolValue {
    phases_value(batch.phases())
}

pub fn address_value(address: Address) -> DynSolValue {
    DynSolValue::Address(address)
}

pub fn uint_value(value: U256) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

pub fn uint_word(value: &DynSolValue, what: &str) -> Result<U256, SimulationError> {
    value
        .as_uint()
        .map(|(word, _)| word)
        .ok_or_else(|| SimulationError::Decoding(format!("{what}: expected uint, got {value:?}")))
}

pub fn int_word(value: &DynSolValue, what: &str) -> Result<I256, SimulationError> {
    value
        .as_int()
        .map(|(word, _)| word)
        .ok_or_else(|| SimulationError::Decoding(format!("{what}: expected int, got {value:?}")))
}

pub fn int_words(value: &DynSolValue, what: &str) -> Result<Vec<I256>, SimulationError> {
    value
        .as_array()
        .ok_or_else(|| SimulationError::Decoding(format!("{what}: expected int[], got {value:?}")))?
        .iter()
        .map(|item| int_word(item, what))
        .collect()
}

/// Gas as reported by the contract, which must fit a u64.
pub fn gas_word(value: &DynSolValue) -> Result<u64, SimulationError> {
    let word = uint_word(value, "gasUsed")?;
    u64::try_from(word).map_err(|_| SimulationError::Overflow(format!("gasUsed {word} exceeds u64")))
}

use crate::contract::{Inputs, ParameterSpec};

const SLOT_OPEN: &str = "{{";
const SLOT_CLOSE: &str = "}}";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template slot \"{0}\" does not name a parameter")]
    UnknownSlot(String),
    #[error("parameter \"{0}\" is never used by the template")]
    UnusedParameter(&'static str),
    #[error("slot opened at byte {0} is never closed")]
    UnterminatedSlot(usize),
    #[error("invalid slot name \"{name}\" at byte {offset}")]
    InvalidSlotName { name: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Slot(&'static str),
}

/// A script with `{{name}}` slots, one per parameter. The slot set is checked
/// against the parameters once, in [`ScriptTemplate::compile`], so rendering
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    segments: Vec<Segment>,
}

impl ScriptTemplate {
    pub fn compile(
        text: &'static str,
        parameters: &[ParameterSpec],
    ) -> Result<Self, TemplateError> {
        let segments = parse(text)?;

        for segment in &segments {
            if let Segment::Slot(name) = segment {
                if !parameters.iter().any(|p| p.name == *name) {
                    return Err(TemplateError::UnknownSlot((*name).to_owned()));
                }
            }
        }

        for parameter in parameters {
            let used = segments
                .iter()
                .any(|segment| *segment == Segment::Slot(parameter.name));

            if !used {
                return Err(TemplateError::UnusedParameter(parameter.name));
            }
        }

        Ok(Self { segments })
    }

    /// Names of the slots in order of appearance, repeats included
    pub fn slots(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(name) => Some(*name),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every slot. Unset optional inputs render as an empty string.
    pub fn render(&self, inputs: &Inputs) -> String {
        let mut script = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => script.push_str(text),
                Segment::Slot(name) => {
                    if let Some(value) = inputs.get(name) {
                        script.push_str(&value.render());
                    }
                }
            }
        }

        script
    }
}

fn parse(text: &'static str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = vec![];
    let mut rest = text;
    let mut offset = 0;

    while let Some(start) = rest.find(SLOT_OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }

        let after_open = &rest[start + SLOT_OPEN.len()..];
        let end = after_open
            .find(SLOT_CLOSE)
            .ok_or(TemplateError::UnterminatedSlot(offset + start))?;

        let name = after_open[..end].trim();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !valid {
            return Err(TemplateError::InvalidSlotName {
                name: name.to_owned(),
                offset: offset + start,
            });
        }

        segments.push(Segment::Slot(name));

        let consumed = start + SLOT_OPEN.len() + end + SLOT_CLOSE.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::contract::{check_inputs, Values};

    use super::*;

    const PARAMETERS: &[ParameterSpec] = &[
        ParameterSpec::file("t2"),
        ParameterSpec::flag("tissue", false),
        ParameterSpec::integer("cores", 1),
    ];

    fn inputs(values: Values) -> Inputs {
        check_inputs("test", PARAMETERS, values, Path::new("/")).unwrap()
    }

    #[test]
    fn dollar_signs_are_literal() {
        let template = ScriptTemplate::compile(
            "x = result$top_voxels\nif (file.exists('{{t2}}')) { np$save('a', {{tissue}}, {{cores}}) }",
            PARAMETERS,
        )
        .unwrap();

        let script = template.render(&inputs(Values::new()));

        assert_eq!(
            script,
            "x = result$top_voxels\nif (file.exists('')) { np$save('a', F, 1) }"
        );
    }

    #[test]
    fn slots_may_repeat() {
        let template = ScriptTemplate::compile(
            "{{tissue}} {{ tissue }} {{t2}} {{cores}}",
            PARAMETERS,
        )
        .unwrap();

        assert_eq!(
            template.slots().collect::<Vec<_>>(),
            vec!["tissue", "tissue", "t2", "cores"]
        );
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let error =
            ScriptTemplate::compile("{{t2}} {{tissue}} {{cores}} {{phase}}", PARAMETERS)
                .unwrap_err();

        assert_eq!(error, TemplateError::UnknownSlot("phase".to_owned()));
    }

    #[test]
    fn unused_parameter_is_rejected() {
        let error = ScriptTemplate::compile("{{t2}} {{tissue}}", PARAMETERS).unwrap_err();

        assert_eq!(error, TemplateError::UnusedParameter("cores"));
    }

    #[test]
    fn malformed_slots_are_rejected() {
        assert_eq!(
            ScriptTemplate::compile("abc {{t2", PARAMETERS).unwrap_err(),
            TemplateError::UnterminatedSlot(4)
        );
        assert!(matches!(
            ScriptTemplate::compile("{{t2}} {{Not Valid}}", PARAMETERS).unwrap_err(),
            TemplateError::InvalidSlotName { offset: 7, .. }
        ));
    }

    #[test]
    fn rendering_is_deterministic() {
        let template =
            ScriptTemplate::compile("{{t2}}|{{tissue}}|{{cores}}", PARAMETERS).unwrap();
        let inputs = inputs(Values::from([
            ("t2".to_owned(), "t2.nii.gz".into()),
            ("tissue".to_owned(), true.into()),
        ]));

        assert_eq!(template.render(&inputs), template.render(&inputs));
        assert_eq!(template.render(&inputs), "t2.nii.gz|T|1");
    }
}

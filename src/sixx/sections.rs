use super::escape::{escape_code, escape_markup, trim_line_ends};
use super::ids::{IdSequence, UuidSource};
use super::node::{Env, Node};
use crate::sketch::{FunctionRecord, PrimitiveType, VariableRecord};

const INPUT_PIN_BASE: i64 = 119_328_430;
const OUTPUT_PIN_BASE: i64 = 153_438_280;
const PIN_STEP: i64 = 1000;

/// Name of the optional boolean gate input.
pub(super) const ENABLE_PIN: &str = "En";

const QUALIFIER_WORDS: [&str; 5] = ["static", "const", "volatile", "extern", "register"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Input,
    Output,
}

/// A pin as it appears on the block.
#[derive(Debug, Clone, Copy)]
pub(super) struct Pin<'a> {
    pub(super) alias: &'a str,
    pub(super) ty: PrimitiveType,
}

/// A configurable parameter, from either a variable or a `#define`.
#[derive(Debug, Clone, Copy)]
pub(super) struct ParameterEntry<'a> {
    pub(super) alias: &'a str,
    pub(super) ty: PrimitiveType,
    pub(super) default: Option<&'a str>,
    pub(super) position: usize,
}

/// Builds nodes in document order so ids come out sequential.
pub(super) struct NodeBuilder<'u> {
    ids: IdSequence,
    uuids: &'u mut dyn UuidSource,
}

impl<'u> NodeBuilder<'u> {
    pub(super) fn new(uuids: &'u mut dyn UuidSource) -> Self {
        Self {
            ids: IdSequence::default(),
            uuids,
        }
    }

    pub(super) fn next_id(&mut self) -> u32 {
        self.ids.allocate()
    }

    pub(super) fn string(&mut self, name: &'static str, escaped: impl Into<String>) -> Node {
        let id = self.next_id();
        Node::string(id, name, escaped)
    }

    pub(super) fn uuid(&mut self, name: &'static str) -> Node {
        let id = self.next_id();
        Node::string(id, name, self.uuids.next_uuid())
    }

    fn data_type(&mut self, ty: PrimitiveType) -> Node {
        let class = ty.sixx_class();
        let type_id = self.next_id();
        let instances_id = self.next_id();
        let instance_id = self.next_id();
        let instance = Node::object(Some(instance_id), None, class, Env::Arduino).with_text("");
        Node::object(
            Some(type_id),
            Some("type"),
            format!("{class} class"),
            Env::Arduino,
        )
        .with_children(vec![Node::collection(
            instances_id,
            "instanceCollection",
            vec![instance],
        )])
    }

    /// One input or output pin; `index` counts pins already on that side.
    pub(super) fn pin(
        &mut self,
        block_id: u32,
        pin: Pin<'_>,
        direction: Direction,
        index: usize,
    ) -> Node {
        let number = match direction {
            Direction::Input => INPUT_PIN_BASE,
            Direction::Output => OUTPUT_PIN_BASE,
        } + PIN_STEP * index as i64;

        let adaptor_id = self.next_id();
        let object_id = self.next_id();
        let number_id = self.next_id();
        let number = Node::small_integer(number_id, "id", number);
        let block = Node::reference("block", block_id);
        let data_type = self.data_type(pin.ty);
        let is_input = Node::flag("isInput", direction == Direction::Input);
        let name_id = self.next_id();
        let name = Node::string(name_id, "name", escape_markup(pin.alias));

        let object = Node::object(
            Some(object_id),
            Some("object"),
            "UniversalBlockInputOutput",
            Env::Arduino,
        )
        .with_children(vec![
            number,
            block,
            data_type,
            is_input,
            name,
            Node::flag("isNot", false),
            Node::reference("nameCash", name_id),
        ]);
        let comment = self.string("comment", "");
        let uuid = self.uuid("id");

        Node::object(
            Some(adaptor_id),
            None,
            "InputsOutputsAdaptorForUserBlock",
            Env::Arduino,
        )
        .with_children(vec![object, comment, uuid])
    }

    pub(super) fn parameter(&mut self, entry: ParameterEntry<'_>) -> Node {
        let adaptor_id = self.next_id();
        let parameter_id = self.next_id();
        let name = self.string("name", escape_markup(entry.alias));
        let data_type = self.data_type(entry.ty);
        let default = self.default_value(entry.ty, entry.default);
        let comment = self.string("comment", "");
        let parameter_uuid = self.uuid("id");

        let parameter = Node::object(
            Some(parameter_id),
            Some("object"),
            "UserBlockParametr",
            Env::Arduino,
        )
        .with_children(vec![
            name,
            data_type,
            Node::flag("hasDefaultValue", true),
            default,
            Node::flag("hasUpRange", false),
            Node::flag("hasDownRange", false),
            comment,
            parameter_uuid,
        ]);
        let adaptor_uuid = self.uuid("id");

        Node::object(
            Some(adaptor_id),
            None,
            "InputsOutputsAdaptorForUserBlock",
            Env::Arduino,
        )
        .with_children(vec![parameter, adaptor_uuid])
    }

    fn default_value(&mut self, ty: PrimitiveType, default: Option<&str>) -> Node {
        if ty.is_string() {
            return self.string("stringDefaultValue", escape_markup(default.unwrap_or("")));
        }
        let (class, literal) = numeric_default(ty, default);
        let id = self.next_id();
        Node::object(Some(id), Some("numberDefaultValue"), class, Env::Core).with_text(literal)
    }

    /// `#include <Lib.h>` as a declare-section define block.
    pub(super) fn include(&mut self, line: &str) -> Node {
        let rest = line
            .trim()
            .trim_start_matches('#')
            .trim_start()
            .trim_start_matches("include")
            .trim();
        let block_id = self.next_id();
        let define = self.string("define", "&#35;include");
        let name = self.string("name", escape_markup(rest));
        Node::object(
            Some(block_id),
            None,
            "CodeUserBlockDeclareDefineBlock",
            Env::Arduino,
        )
        .with_children(vec![define, name])
    }

    pub(super) fn define(&mut self, name: &str, value: &str) -> Node {
        let block_id = self.next_id();
        let define = self.string("define", "&#35;define");
        let name = self.string("name", escape_markup(name));
        let last = self.string("lastPart", escape_markup(value));
        Node::object(
            Some(block_id),
            None,
            "CodeUserBlockDeclareDefineBlock",
            Env::Arduino,
        )
        .with_children(vec![define, name, last])
    }

    /// A verbatim non-primitive declaration such as `Servo myservo;`.
    pub(super) fn opaque(&mut self, statement: &str) -> Node {
        let parts = split_opaque(statement);
        self.standard_declaration(&parts.first, &parts.name, &parts.last)
    }

    /// A plain variable declared under its alias.
    pub(super) fn variable(&mut self, variable: &VariableRecord) -> Node {
        let first = if variable.qualifiers.is_empty() {
            variable.ty.as_str().to_string()
        } else {
            format!("{} {}", variable.qualifiers, variable.ty)
        };
        let last = match variable.default.as_deref() {
            Some(init) => format!("= {};", escape_code(init)),
            None => ";".to_string(),
        };
        self.standard_declaration(&escape_markup(&first), &escape_markup(&variable.alias), &last)
    }

    fn standard_declaration(&mut self, first: &str, name: &str, last: &str) -> Node {
        let block_id = self.next_id();
        let name = self.string("name", name);
        let last = self.string("lastPart", last);
        let first = self.string("firstPart", first);
        Node::object(
            Some(block_id),
            None,
            "CodeUserBlockDeclareStandartBlock",
            Env::Arduino,
        )
        .with_children(vec![name, last, first])
    }

    pub(super) fn function(&mut self, function: &FunctionRecord) -> Node {
        let function_id = self.next_id();
        let body = self.string("functionBody", escape_code(&trim_line_ends(&function.body)));
        let name_id = self.next_id();
        let declare = self.string("declare", escape_markup(&function.return_type));
        let name = self.string("name", escape_markup(&function.name));
        let params_id = self.next_id();
        let params = function
            .params
            .iter()
            .map(|param| {
                let param_id = self.next_id();
                let declare = self.string("declare", escape_markup(&param.ty));
                let name = self.string("name", escape_markup(&param.name));
                Node::object(
                    Some(param_id),
                    None,
                    "CodeUserBlockFunctionParametr",
                    Env::Arduino,
                )
                .with_children(vec![declare, name])
            })
            .collect();

        let signature = Node::object(
            Some(name_id),
            Some("parsesFunctionName"),
            "CodeUserBlockFunctionName",
            Env::Arduino,
        )
        .with_children(vec![
            declare,
            name,
            Node::collection(params_id, "parametrs", params),
        ]);
        Node::object(
            Some(function_id),
            None,
            "CodeUserBlockFunction",
            Env::Arduino,
        )
        .with_children(vec![body, signature])
    }
}

/// SIXX number class and literal for a non-string parameter default.
pub(super) fn numeric_default(ty: PrimitiveType, default: Option<&str>) -> (&'static str, String) {
    let text = default.map(str::trim).filter(|text| !text.is_empty());
    let Some(text) = text else {
        return ("SmallInteger", "0".to_string());
    };

    if ty.is_boolean() {
        let on = text.eq_ignore_ascii_case("true") || text == "1";
        return ("SmallInteger", if on { "1" } else { "0" }.to_string());
    }
    if ty.is_floating() || text.contains('.') {
        if let Ok(value) = text.replace(',', ".").parse::<f64>() {
            if value.is_finite() {
                return ("Float", value.to_string());
            }
        }
    } else if let Ok(value) = text.parse::<i64>() {
        return ("SmallInteger", value.to_string());
    }

    tracing::warn!(
        default = text,
        ty = ty.as_str(),
        "parameter default is not numeric; using 0"
    );
    ("SmallInteger", "0".to_string())
}

#[derive(Debug, PartialEq, Eq)]
struct OpaqueParts {
    first: String,
    name: String,
    last: String,
}

/// Split `static Servo myservo = Servo(3);` into type, name and the rest,
/// already escaped.
fn split_opaque(statement: &str) -> OpaqueParts {
    let statement = statement.trim();
    let statement = statement.strip_suffix(';').unwrap_or(statement).trim_end();

    let mut rest = statement;
    let mut first_words = Vec::new();
    loop {
        let (word, tail) = split_first_word(rest);
        if word.is_empty() {
            break;
        }
        first_words.push(word);
        rest = tail;
        if !QUALIFIER_WORDS.contains(&word) {
            break;
        }
    }
    let (name, tail) = split_first_word(rest);
    let tail = tail.trim();

    // Constructor arguments without `=` are written as an initializer too.
    let last = if tail.is_empty() {
        ";".to_string()
    } else {
        let init = tail.strip_prefix('=').unwrap_or(tail).trim();
        format!("= {};", escape_code(init))
    };

    OpaqueParts {
        first: escape_markup(&first_words.join(" ")),
        name: escape_markup(name),
        last,
    }
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sixx::ids::SequentialUuids;
    use crate::sketch::VariableRole;

    fn written(node: &Node) -> String {
        let mut out = String::new();
        node.write(&mut out, 0);
        out
    }

    #[test]
    fn numeric_defaults_follow_declared_type() {
        assert_eq!(numeric_default(PrimitiveType::Int, Some("100")), ("SmallInteger", "100".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Float, Some("2")), ("Float", "2".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Int, Some("1.5")), ("Float", "1.5".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Float, Some("0,5")), ("Float", "0.5".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Bool, Some("TRUE")), ("SmallInteger", "1".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Boolean, Some("HIGH")), ("SmallInteger", "0".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Long, None), ("SmallInteger", "0".to_string()));
    }

    #[test]
    fn unparseable_numeric_default_falls_back_to_zero() {
        assert_eq!(numeric_default(PrimitiveType::Int, Some("A0")), ("SmallInteger", "0".to_string()));
        assert_eq!(numeric_default(PrimitiveType::Float, Some("1.5f")), ("SmallInteger", "0".to_string()));
    }

    #[test]
    fn splits_opaque_declarations() {
        assert_eq!(
            split_opaque("Servo myservo;"),
            OpaqueParts {
                first: "Servo".to_string(),
                name: "myservo".to_string(),
                last: ";".to_string(),
            }
        );
        assert_eq!(
            split_opaque("static SoftwareSerial port = SoftwareSerial(7, 8);"),
            OpaqueParts {
                first: "static SoftwareSerial".to_string(),
                name: "port".to_string(),
                last: "= SoftwareSerial&#40;7&#44; 8&#41;;".to_string(),
            }
        );
        assert_eq!(split_opaque("int pins[3] = {2, 3, 4};").last, "= {2&#44; 3&#44; 4};");
    }

    #[test]
    fn opaque_tail_without_equals_still_gets_initializer_prefix() {
        assert_eq!(split_opaque("Servo arm (3);").last, "= &#40;3&#41;;");
        assert_eq!(split_opaque("String label {\"x\"};").last, "= {&quot;x&quot;};");
    }

    #[test]
    fn plain_variable_keeps_qualifiers_and_alias() {
        let mut uuids = SequentialUuids::default();
        let mut builder = NodeBuilder::new(&mut uuids);
        let variable = VariableRecord {
            name: "count".to_string(),
            ty: PrimitiveType::UnsignedLong,
            default: Some("max(1, 2)".to_string()),
            role: VariableRole::Variable,
            alias: "ticks".to_string(),
            qualifiers: "static".to_string(),
            position: 0,
        };
        let out = written(&builder.variable(&variable));
        assert!(out.contains("sixx.name=\"name\" sixx.type=\"String\" sixx.env=\"Core\" >ticks<"));
        assert!(out.contains(">= max&#40;1&#44; 2&#41;;<"));
        assert!(out.contains(">static unsigned long<"));
    }

    #[test]
    fn include_drops_directive_keyword() {
        let mut uuids = SequentialUuids::default();
        let mut builder = NodeBuilder::new(&mut uuids);
        let out = written(&builder.include("#include <Servo.h>"));
        assert!(out.contains(">&#35;include<"));
        assert!(out.contains(">&lt;Servo.h&gt;<"));
    }

    #[test]
    fn pins_number_from_their_side_base() {
        let mut uuids = SequentialUuids::default();
        let mut builder = NodeBuilder::new(&mut uuids);
        let pin = Pin {
            alias: "value",
            ty: PrimitiveType::Int,
        };
        let input = written(&builder.pin(1, pin, Direction::Input, 2));
        assert!(input.contains(">119330430<"));
        assert!(input.contains("sixx.name=\"isInput\" sixx.type=\"True\""));
        let output = written(&builder.pin(1, pin, Direction::Output, 0));
        assert!(output.contains(">153438280<"));
        assert!(output.contains("sixx.name=\"isInput\" sixx.type=\"False\""));
    }

    #[test]
    fn string_parameter_uses_string_default() {
        let mut uuids = SequentialUuids::default();
        let mut builder = NodeBuilder::new(&mut uuids);
        let out = written(&builder.parameter(ParameterEntry {
            alias: "label",
            ty: PrimitiveType::String,
            default: Some("\"on\""),
            position: 0,
        }));
        assert!(out.contains("sixx.name=\"stringDefaultValue\" sixx.type=\"String\" sixx.env=\"Core\" >&quot;on&quot;<"));
        assert_eq!(out.matches("sixx.name=\"id\"").count(), 2);
    }

    #[test]
    fn parameter_is_wrapped_in_user_block_adaptor() {
        let mut uuids = SequentialUuids::default();
        let mut builder = NodeBuilder::new(&mut uuids);
        let out = written(&builder.parameter(ParameterEntry {
            alias: "limit",
            ty: PrimitiveType::Int,
            default: Some("10"),
            position: 0,
        }));
        let first_line = out.lines().next().expect("adaptor line");
        assert!(first_line.contains("sixx.type=\"InputsOutputsAdaptorForUserBlock\" sixx.env=\"Arduino\""));
        assert!(out.contains("sixx.name=\"object\" sixx.type=\"UserBlockParametr\" sixx.env=\"Arduino\""));
        assert!(!out.contains("UserBlockParametrAdaptor"));
    }
}

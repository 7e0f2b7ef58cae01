//! SIXX document emitter for FLProg user blocks.
//!
//! Rendering is a pure projection of a fact set; node ids are assigned in
//! document order so identical inputs give identical text apart from UUIDs.

mod escape;
mod ids;
mod node;
mod sections;

pub use ids::{RandomUuids, SequentialUuids, UuidSource};

use crate::sketch::{DefineRole, FactSet, PrimitiveType, VariableRecord, VariableRole};
use anyhow::{Context, Result};
use escape::{escape_code, escape_markup, trim_line_ends};
use node::{Env, Node};
use regex::{Captures, Regex};
use sections::{Direction, NodeBuilder, ParameterEntry, Pin, ENABLE_PIN};
use std::collections::BTreeMap;

/// Run length FLProg stores for the description text.
const INFO_RUN_LENGTH: i64 = 50;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-16\"?>\n";

/// Everything one block document is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub block_name: &'a str,
    pub block_description: &'a str,
    pub facts: &'a FactSet,
    /// Gate the loop body behind an extra boolean `En` input.
    pub enable_input: bool,
}

/// Render with fresh random UUIDs.
pub fn render_document(request: &RenderRequest<'_>) -> Result<String> {
    render(request, &mut RandomUuids)
}

/// Render the complete `.ubi` document text.
pub fn render(request: &RenderRequest<'_>, uuids: &mut dyn UuidSource) -> Result<String> {
    let facts = request.facts;
    let setup_code = prepare_code(&facts.setup_body, &facts.variables)?;
    let mut loop_code = prepare_code(&facts.loop_body, &facts.variables)?;
    if request.enable_input {
        loop_code = format!("if({ENABLE_PIN})\n{{\n{loop_code}\n}}");
    }

    let inputs = facts.variables_in_source_order(VariableRole::Input);
    let outputs = facts.variables_in_source_order(VariableRole::Output);
    let parameters = parameter_entries(facts);
    let plain = facts.variables_in_source_order(VariableRole::Variable);

    let mut builder = NodeBuilder::new(uuids);
    let root_id = builder.next_id();
    let block_id = builder.next_id();
    let mut fields = vec![builder.uuid("id")];
    let blocks_id = builder.next_id();
    fields.push(Node::collection(blocks_id, "blocks", Vec::new()));
    fields.push(builder.string("label", escape_markup(request.block_name)));

    let inputs_id = builder.next_id();
    let mut input_pins = Vec::new();
    if request.enable_input {
        let gate = Pin {
            alias: ENABLE_PIN,
            ty: PrimitiveType::Boolean,
        };
        input_pins.push(builder.pin(block_id, gate, Direction::Input, 0));
    }
    let shift = usize::from(request.enable_input);
    for (index, variable) in inputs.iter().enumerate() {
        let pin = pin_for(variable);
        input_pins.push(builder.pin(block_id, pin, Direction::Input, index + shift));
    }
    fields.push(Node::collection(inputs_id, "inputs", input_pins));

    let outputs_id = builder.next_id();
    let output_pins = outputs
        .iter()
        .enumerate()
        .map(|(index, variable)| builder.pin(block_id, pin_for(variable), Direction::Output, index))
        .collect();
    fields.push(Node::collection(outputs_id, "outputs", output_pins));

    let variables_id = builder.next_id();
    fields.push(Node::collection(variables_id, "variables", Vec::new()));
    fields.push(builder.string("name", escape_markup(request.block_name)));
    fields.push(info(&mut builder, request.block_description));

    let parameters_id = builder.next_id();
    let parameter_nodes = parameters
        .iter()
        .map(|entry| builder.parameter(*entry))
        .collect();
    fields.push(Node::collection(parameters_id, "parametrs", parameter_nodes));

    fields.push(code_part(
        &mut builder,
        "loopCodePart",
        "CodeUserBlockLoopCodePart",
        &loop_code,
    ));
    fields.push(code_part(
        &mut builder,
        "setupCodePart",
        "CodeUserBlockSetupCodePart",
        &setup_code,
    ));

    let declare_id = builder.next_id();
    let declarations_id = builder.next_id();
    let mut declarations = Vec::new();
    for line in &facts.includes {
        declarations.push(builder.include(line));
    }
    for define in facts.defines.iter().filter(|d| d.role == DefineRole::Global) {
        declarations.push(builder.define(&define.name, &define.value));
    }
    for statement in &facts.opaque_declarations {
        declarations.push(builder.opaque(statement));
    }
    for variable in &plain {
        declarations.push(builder.variable(variable));
    }
    let declaration_count = declarations.len();
    fields.push(
        Node::object(
            Some(declare_id),
            Some("declareCodePart"),
            "CodeUserBlockDeclareCodePart",
            Env::Arduino,
        )
        .with_children(vec![Node::collection(declarations_id, "code", declarations)]),
    );

    let function_part_id = builder.next_id();
    let functions_id = builder.next_id();
    let functions = facts
        .functions
        .iter()
        .map(|function| builder.function(function))
        .collect();
    fields.push(
        Node::object(
            Some(function_part_id),
            Some("functionCodePart"),
            "CodeUserBlockFunctuinCodePart",
            Env::Arduino,
        )
        .with_children(vec![Node::collection(functions_id, "code", functions)]),
    );

    let libraries_id = builder.next_id();
    fields.push(Node::collection(libraries_id, "userLibraries", Vec::new()));
    fields.push(Node::flag("notCanManyUse", false));

    let block = Node::object(
        Some(block_id),
        Some("typeClass"),
        "CodeUserBlock",
        Env::Arduino,
    )
    .with_children(fields);
    let root = Node::object(Some(root_id), None, "BlocksLibraryElement", Env::Arduino)
        .with_children(vec![block]);

    let mut out = String::from(XML_DECLARATION);
    root.write(&mut out, 0);

    tracing::debug!(
        block = request.block_name,
        inputs = inputs.len() + shift,
        outputs = outputs.len(),
        parameters = parameters.len(),
        declarations = declaration_count,
        functions = facts.functions.len(),
        "rendered block"
    );
    Ok(out)
}

fn pin_for(variable: &VariableRecord) -> Pin<'_> {
    Pin {
        alias: &variable.alias,
        ty: variable.ty,
    }
}

/// Parameter variables and parameter defines, jointly in source order.
fn parameter_entries(facts: &FactSet) -> Vec<ParameterEntry<'_>> {
    let mut entries: Vec<ParameterEntry<'_>> = facts
        .variables_in_source_order(VariableRole::Parameter)
        .into_iter()
        .map(|variable| ParameterEntry {
            alias: &variable.alias,
            ty: variable.ty,
            default: variable.default.as_deref(),
            position: variable.position,
        })
        .collect();
    entries.extend(
        facts
            .defines
            .iter()
            .filter(|define| define.role == DefineRole::Parameter)
            .map(|define| ParameterEntry {
                alias: &define.name,
                ty: define.ty,
                default: Some(&define.value),
                position: define.position,
            }),
    );
    entries.sort_by_key(|entry| entry.position);
    entries
}

/// Entry-point body with aliases applied and trailing whitespace removed.
fn prepare_code(body: &str, variables: &BTreeMap<String, VariableRecord>) -> Result<String> {
    let renamed = substitute_aliases(body, variables)?;
    Ok(trim_line_ends(&renamed))
}

/// Replace every renamed variable by its alias, whole words only, in one pass.
fn substitute_aliases(code: &str, variables: &BTreeMap<String, VariableRecord>) -> Result<String> {
    let renames: BTreeMap<&str, &str> = variables
        .values()
        .filter(|variable| variable.is_renamed())
        .map(|variable| (variable.name.as_str(), variable.alias.as_str()))
        .collect();
    if renames.is_empty() {
        return Ok(code.to_string());
    }

    let alternation = renames
        .keys()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&format!(r"\b(?:{alternation})\b"))
        .context("build alias substitution pattern")?;
    let replaced = pattern.replace_all(code, |caps: &Captures<'_>| {
        let found = &caps[0];
        renames.get(found).copied().unwrap_or(found).to_string()
    });
    Ok(replaced.into_owned())
}

fn info(builder: &mut NodeBuilder<'_>, description: &str) -> Node {
    let info_id = builder.next_id();
    let text = builder.string("string", escape_markup(description));
    let runs_id = builder.next_id();
    let run_lengths_id = builder.next_id();
    let run_length_id = builder.next_id();
    let run_length = Node::object(Some(run_length_id), None, "SmallInteger", Env::Core)
        .with_text(INFO_RUN_LENGTH.to_string());
    let values_id = builder.next_id();
    let undefined = Node::object(None, None, "UndefinedObject", Env::Core);

    let runs = Node::object(Some(runs_id), Some("runs"), "RunArray", Env::Core).with_children(vec![
        Node::object(Some(run_lengths_id), Some("runs"), "Array", Env::Core)
            .with_children(vec![run_length]),
        Node::object(Some(values_id), Some("values"), "Array", Env::Core)
            .with_children(vec![undefined]),
    ]);
    Node::object(Some(info_id), Some("info"), "Text", Env::Core).with_children(vec![text, runs])
}

fn code_part(
    builder: &mut NodeBuilder<'_>,
    name: &'static str,
    class: &'static str,
    code: &str,
) -> Node {
    let part_id = builder.next_id();
    let code = builder.string("code", escape_code(code));
    Node::object(Some(part_id), Some(name), class, Env::Arduino).with_children(vec![code])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::extract;

    const SAMPLE: &str = "int sensorValue = 0; // in\n\
                          int outputValue = 0; // out\n\
                          int threshold = 100; // par\n\
                          void setup(){Serial.begin(9600);}\n\
                          void loop(){outputValue = sensorValue > threshold ? 1 : 0;}";

    fn render_facts(facts: &FactSet, enable_input: bool) -> String {
        let request = RenderRequest {
            block_name: "Threshold",
            block_description: "Compares a reading",
            facts,
            enable_input,
        };
        render(&request, &mut SequentialUuids::default()).expect("render")
    }

    fn pin_names(doc: &str, collection: &str) -> Vec<String> {
        let open = format!("sixx.name=\"{collection}\" sixx.type=\"OrderedCollection\"");
        let start = doc.find(&open).expect("collection present");
        let section = &doc[start..];
        let end = section.find("\n\t\t<sixx.object").unwrap_or(section.len());
        let section = &section[..end];
        let marker = "sixx.name=\"name\" sixx.type=\"String\" sixx.env=\"Core\" >";
        section
            .match_indices(marker)
            .map(|(at, _)| {
                let rest = &section[at + marker.len()..];
                rest[..rest.find('<').unwrap_or(rest.len())].to_string()
            })
            .collect()
    }

    #[test]
    fn renders_sample_sketch_roles() {
        let facts = extract(SAMPLE);
        let doc = render_facts(&facts, false);
        assert_eq!(pin_names(&doc, "inputs"), vec!["sensorValue"]);
        assert_eq!(pin_names(&doc, "outputs"), vec!["outputValue"]);
        assert_eq!(pin_names(&doc, "parametrs"), vec!["threshold"]);
        assert!(doc.contains("sixx.name=\"numberDefaultValue\" sixx.type=\"SmallInteger\" sixx.env=\"Core\" >100<"));
        assert!(doc.contains(">outputValue = sensorValue &gt; threshold ? 1 : 0;<"));
        assert!(doc.contains(">Serial.begin&#40;9600&#41;;<"));
        assert!(doc.starts_with(
            "<?xml version=\"1.0\" encoding=\"utf-16\"?>\n\
             <sixx.object sixx.id=\"0\" sixx.type=\"BlocksLibraryElement\" sixx.env=\"Arduino\" >\n\
             \t<sixx.object sixx.id=\"1\" sixx.name=\"typeClass\" sixx.type=\"CodeUserBlock\" sixx.env=\"Arduino\" >\n"
        ));
        assert!(doc.ends_with("\t</sixx.object>\n</sixx.object>\n"));
    }

    #[test]
    fn renders_are_identical_with_the_same_uuid_source() {
        let facts = extract(SAMPLE);
        assert_eq!(render_facts(&facts, true), render_facts(&facts, true));
    }

    #[test]
    fn random_uuids_are_the_only_difference() {
        let facts = extract(SAMPLE);
        let request = RenderRequest {
            block_name: "Threshold",
            block_description: "",
            facts: &facts,
            enable_input: false,
        };
        let first = render_document(&request).expect("render");
        let second = render_document(&request).expect("render");
        assert_ne!(first, second);
        let uuid = Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("regex for uuids");
        assert_eq!(uuid.replace_all(&first, "U"), uuid.replace_all(&second, "U"));
    }

    #[test]
    fn node_ids_are_unique_and_sequential() {
        let facts = extract(SAMPLE);
        let doc = render_facts(&facts, true);
        let id = Regex::new(r#"sixx\.id="(\d+)""#).expect("regex for ids");
        let ids: Vec<u32> = id
            .captures_iter(&doc)
            .map(|caps| caps[1].parse().expect("numeric id"))
            .collect();
        let expected: Vec<u32> = (0..ids.len() as u32).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn enable_gate_wraps_loop_once_and_adds_one_input() {
        let facts = extract(SAMPLE);
        let doc = render_facts(&facts, true);
        assert_eq!(pin_names(&doc, "inputs"), vec!["En", "sensorValue"]);
        assert_eq!(doc.matches("if&#40;En&#41;").count(), 1);
        assert!(doc.contains(">if&#40;En&#41;\n{\noutputValue = sensorValue &gt; threshold ? 1 : 0;\n}<"));
        assert!(doc.contains(">119328430<"));
        assert!(doc.contains(">119329430<"));
        assert_eq!(doc.matches("BooleanDataType class").count(), 1);
    }

    #[test]
    fn aliases_replace_whole_words_simultaneously() {
        let mut facts = extract(
            "int a; // in\nint b; // out\nvoid setup() {}\nvoid loop() { b = a + abc; a = b; }",
        );
        if let Some(a) = facts.variables.get_mut("a") {
            a.alias = "b".to_string();
        }
        if let Some(b) = facts.variables.get_mut("b") {
            b.alias = "a".to_string();
        }
        let doc = render_facts(&facts, false);
        assert!(doc.contains(">a = b + abc; b = a;<"));
        assert_eq!(pin_names(&doc, "inputs"), vec!["b"]);
    }

    #[test]
    fn pins_follow_source_order() {
        let facts = extract(
            "int zeta; // in\nint alpha; // in\nint mid; // in\nvoid setup() {}\nvoid loop() {}",
        );
        let doc = render_facts(&facts, false);
        assert_eq!(pin_names(&doc, "inputs"), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn global_define_lands_in_declare_section() {
        let facts = extract("#define LED_PIN 13\nvoid setup() { pinMode(LED_PIN, OUTPUT); }\nvoid loop() {}");
        let doc = render_facts(&facts, false);
        assert!(pin_names(&doc, "parametrs").is_empty());
        let declare = &doc[doc.find("declareCodePart").expect("declare part")..];
        assert!(declare.contains(">&#35;define<"));
        assert!(declare.contains(">LED_PIN<"));
        assert!(declare.contains("sixx.name=\"lastPart\" sixx.type=\"String\" sixx.env=\"Core\" >13<"));
    }

    #[test]
    fn parameter_defines_merge_with_parameter_variables_by_position() {
        let facts = extract(
            "int gain = 2; // par\n#define LIMIT 10 // par\nfloat ratio = 0.5; // par\nvoid setup() {}\nvoid loop() {}",
        );
        let doc = render_facts(&facts, false);
        assert_eq!(pin_names(&doc, "parametrs"), vec!["gain", "LIMIT", "ratio"]);
        assert!(doc.contains("sixx.type=\"Float\" sixx.env=\"Core\" >0.5<"));
        assert!(!doc.contains(">&#35;define<"));
    }

    #[test]
    fn declare_section_orders_includes_defines_opaque_then_variables() {
        let facts = extract(
            "int counter = 0;\nServo arm;\n#define RATE 9600\n#include <Servo.h>\nvoid setup() {}\nvoid loop() {}",
        );
        let doc = render_facts(&facts, false);
        let include = doc.find("&lt;Servo.h&gt;").expect("include");
        let define = doc.find(">RATE<").expect("define");
        let opaque = doc.find(">arm<").expect("opaque");
        let variable = doc.find(">counter<").expect("variable");
        assert!(include < define && define < opaque && opaque < variable);
        assert!(doc.contains(">= 0;<"));
    }

    #[test]
    fn functions_render_with_signature_and_escaped_body() {
        let facts = extract(
            "void setup() {}\nvoid loop() {}\nint scale(int v, float k) {\n  return v * k;   \n}",
        );
        let doc = render_facts(&facts, false);
        assert!(doc.contains("sixx.type=\"CodeUserBlockFunctuinCodePart\""));
        assert!(doc.contains("sixx.name=\"functionBody\" sixx.type=\"String\" sixx.env=\"Core\" >return v * k;<"));
        assert_eq!(doc.matches("CodeUserBlockFunctionParametr").count(), 2);
        assert!(doc.contains(">scale<"));
    }

    #[test]
    fn empty_facts_still_render_a_complete_block() {
        let facts = FactSet::default();
        let doc = render_facts(&facts, false);
        for section in ["inputs", "outputs", "variables", "parametrs", "userLibraries"] {
            assert!(doc.contains(&format!(
                "sixx.name=\"{section}\" sixx.type=\"OrderedCollection\" sixx.env=\"Core\" ></sixx.object>"
            )));
        }
        assert!(doc.contains("sixx.name=\"notCanManyUse\" sixx.type=\"False\""));
    }

    #[test]
    fn block_name_and_description_are_escaped() {
        let facts = FactSet::default();
        let request = RenderRequest {
            block_name: "A&B",
            block_description: "x < y",
            facts: &facts,
            enable_input: false,
        };
        let doc = render(&request, &mut SequentialUuids::default()).expect("render");
        assert!(doc.contains("sixx.name=\"label\" sixx.type=\"String\" sixx.env=\"Core\" >A&amp;B<"));
        assert!(doc.contains(">x &lt; y<"));
    }
}

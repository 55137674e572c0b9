//! OLX problems and open response assessments for QTI problem records.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::OlxGenerator;
use crate::content::qti::{
    ChoiceProblem, EssayProblem, FibProblem, Problem, ProblemData, QtiError, QtiProfile,
};
use crate::links::percent_decode;
use crate::olx::{Element, Node};
use crate::settings::ConversionOptions;

const FIB_TEXTLINE_SIZE_BUFFER: usize = 10;

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

pub struct QtiGenerator;

impl OlxGenerator for QtiGenerator {
    type Content = Vec<Problem>;

    fn create_nodes(
        &self,
        problems: &Vec<Problem>,
        _options: &ConversionOptions,
    ) -> anyhow::Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for problem in problems {
            // An unknown profile fails the whole assessment.
            let profile: QtiProfile = problem.cc_profile.parse()?;
            nodes.extend(create_problem(profile, problem)?);
        }
        Ok(nodes)
    }
}

fn create_problem(profile: QtiProfile, problem: &Problem) -> anyhow::Result<Vec<Node>> {
    let nodes = match (profile, &problem.data) {
        (QtiProfile::PatternMatch, _) => return Err(QtiError::NotImplemented(profile).into()),
        (QtiProfile::MultipleChoice | QtiProfile::Boolean, Some(ProblemData::Choice(choice))) => {
            vec![multiple_choice_problem(choice).into()]
        }
        (QtiProfile::MultipleResponse, Some(ProblemData::Choice(choice))) => {
            vec![multiple_response_problem(choice).into()]
        }
        (QtiProfile::FillInBlank, Some(ProblemData::FillInBlank(fib))) => {
            vec![fib_problem(fib).into()]
        }
        (QtiProfile::Essay, Some(ProblemData::Essay(essay))) => {
            essay_problem(&problem.ident, essay)?
        }
        _ => {
            let ident = problem.ident.clone();
            return Err(QtiError::MissingProblemData { ident, profile }.into());
        }
    };
    Ok(nodes)
}

fn multiple_choice_problem(problem: &ChoiceProblem) -> Element {
    let choicegroup = Element::new("choicegroup")
        .attr("type", "MultipleChoice")
        .children(choices(problem));
    let response = Element::new("multiplechoiceresponse")
        .child(render_description(&problem.problem_description))
        .child(choicegroup);
    Element::new("problem").child(response)
}

// Partial credit defaults to EDC.
fn multiple_response_problem(problem: &ChoiceProblem) -> Element {
    let checkboxgroup = Element::new("checkboxgroup")
        .attr("type", "MultipleChoice")
        .children(choices(problem));
    let response = Element::new("choiceresponse")
        .attr("partial_credit", "EDC")
        .child(render_description(&problem.problem_description))
        .child(checkboxgroup);
    Element::new("problem").child(response)
}

fn choices(problem: &ChoiceProblem) -> Vec<Element> {
    problem
        .choices
        .values()
        .map(|choice| {
            Element::new("choice")
                .attr("correct", if choice.correct { "true" } else { "false" })
                .text(choice.text.as_str())
        })
        .collect()
}

fn fib_problem(problem: &FibProblem) -> Element {
    let problem_type = if problem.is_regexp { "ci regexp" } else { "ci" };
    let max_answer_length = std::iter::once(&problem.answer)
        .chain(&problem.additional_answers)
        .map(|answer| answer.chars().count())
        .max()
        .unwrap_or_default();
    let textline_size = max_answer_length + FIB_TEXTLINE_SIZE_BUFFER;

    let additional_answers = problem
        .additional_answers
        .iter()
        .map(|answer| Element::new("additional_answer").attr("answer", answer));
    let textline = Element::new("textline").attr("size", textline_size.to_string());
    let response = Element::new("stringresponse")
        .attr("answer", problem.answer.as_str())
        .attr("type", problem_type)
        .child(render_description(&problem.problem_description))
        .children(additional_answers)
        .child(textline);
    Element::new("problem").child(response)
}

/// An open response assessment, preceded by an HTML block holding the
/// sample solution when there is one.
fn essay_problem(ident: &str, problem: &EssayProblem) -> anyhow::Result<Vec<Node>> {
    let criterion = if problem.has_feedback() {
        let feedback = [
            ("General", &problem.general_fb),
            ("Correct", &problem.correct_fb),
            ("Incorrect", &problem.general_incorrect_fb),
        ];
        let options = feedback
            .into_iter()
            .map(|(label, text)| rubric_option(label, "0", text.as_deref().unwrap_or(label)));
        Element::new("criterion")
            .attr("feedback", "optional")
            .child(Element::new("name").text("Feedback"))
            .child(Element::new("label").text("Feedback"))
            .child(Element::new("prompt").text("Example Feedback"))
            .children(options)
    } else {
        Element::new("criterion")
            .attr("feedback", "optional")
            .child(Element::new("name").text("Ideas"))
            .child(Element::new("label").text("Ideas"))
            .child(Element::new("prompt").text("Example criterion"))
            .child(rubric_option("Poor", "0", "Explanation"))
            .child(rubric_option("Good", "1", "Explanation"))
    };

    let description = render_description(&problem.problem_description).to_xml()?;
    let prompt = Element::new("prompt").child(Element::new("description").text(description));
    let staff_assessment = Element::new("assessment")
        .attr("name", "staff-assessment")
        .attr("required", "True");
    let rubric = Element::new("rubric")
        .child(criterion)
        .child(Element::new("feedbackprompt").text("Feedback prompt text"))
        .child(Element::new("feedback_default_text").text("Feedback prompt default text"));

    let assessment = Element::new("openassessment")
        .attr("url_name", ident)
        .attr("text_response", "required")
        .attr("prompts_type", "html")
        .child(Element::new("title").text("Open Response Assessment"))
        .child(Element::new("assessments").child(staff_assessment))
        .child(Element::new("prompts").child(prompt))
        .child(rubric);

    let mut nodes = Vec::with_capacity(2);
    if let Some(sample_solution) = problem.sample_solution.as_deref().filter(|s| !s.is_empty()) {
        nodes.push(Element::new("html").cdata(sample_solution).into());
    }
    nodes.push(assessment.into());
    Ok(nodes)
}

fn rubric_option(label: &str, points: &str, explanation: &str) -> Element {
    Element::new("option")
        .attr("points", points)
        .child(Element::new("name").text(label))
        .child(Element::new("label").text(label))
        .child(Element::new("explanation").text(explanation))
}

/// Turns a QTI material text into a well-formed element.
///
/// The text is HTML-unescaped and percent-decoded, then parsed leniently as
/// HTML. A lone element is returned as it is, inline content is wrapped in
/// a `<p>` and anything holding block elements in a `<div>`.
pub fn render_description(description: &str) -> Element {
    let unescaped = html_escape::decode_html_entities(description);
    let decoded = percent_decode(&unescaped);

    let dom = parse_document(RcDom::default(), Default::default()).one(decoded.as_str());
    let nodes = find_element(&dom.document, "body")
        .map(|body| convert_children(&body))
        .unwrap_or_default();

    let significant: Vec<&Node> = nodes
        .iter()
        .filter(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()))
        .collect();
    if let [Node::Element(element)] = significant.as_slice() {
        return element.clone();
    }

    let has_block = significant.iter().any(|node| {
        matches!(node, Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name.as_str()))
    });
    let wrapper = if has_block { "div" } else { "p" };
    if significant.is_empty() {
        return Element::new(wrapper);
    }
    Element::new(wrapper).children(nodes)
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            if &*name.local == tag {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut element = Element::new(&name.local);
            for attribute in attrs.borrow().iter() {
                element.set_attribute(&attribute.name.local, attribute.value.to_string());
            }
            element.children = convert_children(handle);
            Some(element.into())
        }
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        _ => None,
    }
}

fn convert_children(handle: &Handle) -> Vec<Node> {
    let children = handle.children.borrow();
    children.iter().filter_map(convert).collect()
}

//! Typed read access to QTI 1.2 assessment documents.

use super::XmlElement;

/// Every `<item>` of an assessment, in document order.
pub fn items(root: &XmlElement) -> Vec<QtiItem<'_>> {
    root.descendants_named("item")
        .into_iter()
        .map(QtiItem)
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct QtiItem<'a>(pub &'a XmlElement);

impl<'a> QtiItem<'a> {
    pub fn ident(&self) -> Option<&'a str> {
        self.0.attr("ident")
    }

    pub fn title(&self) -> Option<&'a str> {
        self.0.attr("title")
    }

    /// The `cc_profile` metadata field naming the question type.
    pub fn profile(&self) -> Option<String> {
        let metadata = self.0.find("itemmetadata/qtimetadata")?;
        metadata
            .children_named("qtimetadatafield")
            .find(|field| {
                field
                    .child("fieldlabel")
                    .and_then(|label| label.text())
                    .is_some_and(|label| label.trim() == "cc_profile")
            })
            .and_then(|field| field.child("fieldentry"))
            .and_then(|entry| entry.text())
            .map(|entry| entry.trim().to_string())
    }

    pub fn description(&self) -> Option<String> {
        self.0
            .find("presentation/material/mattext")
            .and_then(|mattext| mattext.text())
    }

    pub fn response_labels(&self) -> Vec<ResponseLabel<'a>> {
        self.0
            .child("presentation")
            .map(|presentation| {
                presentation
                    .descendants_named("response_label")
                    .into_iter()
                    .map(ResponseLabel)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn respconditions(&self) -> Vec<RespCondition<'a>> {
        self.0
            .child("resprocessing")
            .map(|resprocessing| {
                resprocessing
                    .children_named("respcondition")
                    .map(RespCondition)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of the sample solution attached to an item's feedback.
    pub fn solution_text(&self) -> Option<String> {
        self.0
            .children_named("itemfeedback")
            .find_map(|feedback| feedback.child("solution"))
            .and_then(|solution| solution.descendants_named("mattext").into_iter().next())
            .and_then(|mattext| mattext.text())
    }

    pub fn has_itemfeedback(&self) -> bool {
        self.0.child("itemfeedback").is_some()
    }

    pub fn itemfeedback_text(&self, ident: &str) -> Option<String> {
        self.0
            .children_named("itemfeedback")
            .find(|feedback| feedback.attr("ident") == Some(ident))
            .and_then(|feedback| feedback.find("flow_mat/material/mattext"))
            .and_then(|mattext| mattext.text())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseLabel<'a>(pub &'a XmlElement);

impl<'a> ResponseLabel<'a> {
    pub fn ident(&self) -> Option<&'a str> {
        self.0.attr("ident")
    }

    pub fn text(&self) -> Option<String> {
        self.0
            .descendants_named("mattext")
            .into_iter()
            .next()
            .and_then(|mattext| mattext.text())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RespCondition<'a>(pub &'a XmlElement);

impl<'a> RespCondition<'a> {
    /// Whether evaluation stops after this condition. Anything other than an
    /// explicit `continue="No"` or a missing attribute keeps scanning.
    pub fn stops_scan(&self) -> bool {
        self.0.attr("continue").unwrap_or("No") == "No"
    }

    pub fn varequals(&self) -> Vec<String> {
        self.conditionvar_values(None, "varequal")
    }

    pub fn and_varequals(&self) -> Vec<String> {
        self.conditionvar_values(Some("and"), "varequal")
    }

    pub fn or_varequals(&self) -> Vec<String> {
        self.conditionvar_values(Some("or"), "varequal")
    }

    pub fn varsubstrings(&self) -> Vec<String> {
        self.conditionvar_values(None, "varsubstring")
    }

    pub fn has_display_feedback(&self, linkrefid: &str) -> bool {
        self.0
            .children_named("displayfeedback")
            .any(|feedback| feedback.attr("linkrefid") == Some(linkrefid))
    }

    fn conditionvar_values(&self, operator: Option<&str>, name: &str) -> Vec<String> {
        let Some(conditionvar) = self.0.child("conditionvar") else {
            return Vec::new();
        };
        let parents: Vec<&XmlElement> = match operator {
            Some(operator) => conditionvar.children_named(operator).collect(),
            None => vec![conditionvar],
        };
        parents
            .into_iter()
            .flat_map(|parent| parent.children_named(name))
            .map(|element| element.text().unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    const ITEM: &str = r#"
        <questestinterop>
          <assessment ident="a1">
            <section ident="root_section">
              <item ident="q1" title="Question">
                <itemmetadata>
                  <qtimetadata>
                    <qtimetadatafield>
                      <fieldlabel>cc_profile</fieldlabel>
                      <fieldentry>cc.multiple_response.v0p1</fieldentry>
                    </qtimetadatafield>
                  </qtimetadata>
                </itemmetadata>
                <presentation>
                  <material><mattext texttype="text/html">&lt;p&gt;Pick&lt;/p&gt;</mattext></material>
                  <response_lid ident="response1">
                    <render_choice>
                      <response_label ident="1"><material><mattext>One</mattext></material></response_label>
                      <response_label ident="2"><material><mattext>Two</mattext></material></response_label>
                    </render_choice>
                  </response_lid>
                </presentation>
                <resprocessing>
                  <respcondition continue="No">
                    <conditionvar>
                      <and>
                        <varequal respident="response1">1</varequal>
                        <not><varequal respident="response1">2</varequal></not>
                      </and>
                    </conditionvar>
                  </respcondition>
                </resprocessing>
              </item>
            </section>
          </assessment>
        </questestinterop>"#;

    #[test]
    fn reads_item_fields() {
        let root = parse_str(ITEM).unwrap();
        let items = items(&root);
        assert_eq!(items.len(), 1);

        let item = items[0];
        assert_eq!(item.ident(), Some("q1"));
        assert_eq!(item.profile().as_deref(), Some("cc.multiple_response.v0p1"));
        assert_eq!(item.description().as_deref(), Some("<p>Pick</p>"));

        let labels: Vec<_> = item
            .response_labels()
            .iter()
            .map(|label| (label.ident().unwrap(), label.text().unwrap()))
            .collect();
        let expected = vec![("1", "One".to_string()), ("2", "Two".to_string())];
        assert_eq!(labels, expected);
    }

    #[test]
    fn nested_not_is_not_part_of_and_assertions() {
        let root = parse_str(ITEM).unwrap();
        let conditions = items(&root)[0].respconditions();
        assert_eq!(conditions.len(), 1);
        assert!(conditions[0].varequals().is_empty());
        assert_eq!(conditions[0].and_varequals(), vec!["1"]);
        assert!(conditions[0].stops_scan());
    }
}

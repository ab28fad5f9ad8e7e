use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.with_context(|| format!("malformed attribute on <{name}>"))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .with_context(|| format!("malformed attribute value on <{name}>"))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|element| element.name == name)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    fn is_footnote(&self) -> bool {
        self.name == "note"
            || (self.name == "ref" && self.attribute("class") == Some("footnoteRef"))
    }

    /// Drops footnote children while keeping the text that follows them. A
    /// no-break space left dangling before a removed footnote is trimmed.
    pub fn strip_footnotes(&mut self) {
        let mut index = 0;
        while index < self.children.len() {
            let is_footnote = matches!(
                &self.children[index],
                XmlNode::Element(element) if element.is_footnote()
            );
            if !is_footnote {
                index += 1;
                continue;
            }

            let has_tail = matches!(self.children.get(index + 1), Some(XmlNode::Text(_)));
            self.children.remove(index);

            if has_tail && index > 0 {
                if let Some(XmlNode::Text(previous)) = self.children.get_mut(index - 1) {
                    if previous.ends_with(['\u{00a0}', '\u{202f}']) {
                        previous.pop();
                    }
                }
            }
        }
    }
}

pub(super) fn parse_xml_document(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(XmlElement::from_start(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = XmlElement::from_start(e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    bail!("unbalanced end tag in xml document");
                };
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().context("failed to decode xml text")?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e).into_owned();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("xml parse error near byte {}", reader.buffer_position())
                });
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        bail!("xml document ended with {} unclosed element(s)", stack.len());
    }

    root.context("xml document has no root element")
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

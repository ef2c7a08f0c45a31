use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{EfacturaError, round_money};

pub type XmlResult = Result<String, EfacturaError>;

fn xml_io(e: std::io::Error) -> EfacturaError {
    EfacturaError::Xml(format!("failed to write XML event: {e}"))
}

/// Thin wrapper over the quick-xml writer. Text and attribute values go
/// through quick-xml's escaping, which covers all five XML metacharacters.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, EfacturaError> {
        let mut w = Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        };
        w.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(w)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<&mut Self, EfacturaError> {
        self.writer.write_event(event).map_err(xml_io)?;
        Ok(self)
    }

    pub fn into_string(self) -> Result<String, EfacturaError> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| EfacturaError::Xml(format!("generated XML is not UTF-8: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, EfacturaError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EfacturaError> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.emit(Event::Start(start))
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, EfacturaError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, EfacturaError> {
        self.text_element_with_attrs(name, text, &[])
    }

    /// Opening tag, escaped text node, closing tag.
    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EfacturaError> {
        self.start_element_with_attrs(name, attrs)?
            .emit(Event::Text(BytesText::new(text)))?
            .end_element(name)
    }

    /// Write a monetary amount with currencyID attribute.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, EfacturaError> {
        self.text_element_with_attrs(name, &format_amount(amount), &[("currencyID", currency)])
    }

    /// Write a unit price with currencyID attribute. Prices keep their
    /// precision beyond two decimals.
    pub fn price_element(
        &mut self,
        name: &str,
        price: Decimal,
        currency: &str,
    ) -> Result<&mut Self, EfacturaError> {
        self.text_element_with_attrs(name, &format_decimal(price), &[("currencyID", currency)])
    }

    /// Write a quantity with unitCode attribute.
    pub fn quantity_element(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
    ) -> Result<&mut Self, EfacturaError> {
        self.text_element_with_attrs(name, &format_decimal(qty), &[("unitCode", unit)])
    }
}

/// Format a monetary amount with exactly two decimals, rounding half away
/// from zero. Zero is never written as "-0.00".
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = round_money(d);
    rounded.rescale(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Format a VAT rate without trailing zeros ("21", "9", "5.5").
pub fn format_rate(d: Decimal) -> String {
    let mut n = d.normalize();
    if n.is_zero() {
        n.set_sign_positive(true);
    }
    n.to_string()
}

/// Format a Decimal for XML output: at least two decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let mut n = d.normalize();
    if n.is_zero() {
        n.set_sign_positive(true);
    }
    if n.scale() < 2 {
        n.rescale(2);
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(1487.5)), "1487.50");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(-0.004)), "0.00");
        assert_eq!(format_amount(dec!(-237.50)), "-237.50");
        assert_eq!(format_amount(dec!(18.9981)), "19.00");
    }

    #[test]
    fn format_rate_cases() {
        assert_eq!(format_rate(dec!(21.00)), "21");
        assert_eq!(format_rate(dec!(11)), "11");
        assert_eq!(format_rate(dec!(0.00)), "0");
        assert_eq!(format_rate(dec!(5.50)), "5.5");
    }

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(100)), "100.00");
        assert_eq!(format_decimal(dec!(49.90)), "49.90");
        assert_eq!(format_decimal(dec!(0.005)), "0.005");
        assert_eq!(format_decimal(dec!(-1)), "-1.00");
    }

    #[test]
    fn text_is_escaped() {
        let mut w = XmlWriter::new().unwrap();
        w.text_element_with_attrs("cbc:Note", r#"A & B <"x"> 'y'"#, &[("name", "a&b")])
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("A &amp; B &lt;&quot;x&quot;&gt; &apos;y&apos;"));
        assert!(xml.contains(r#"name="a&amp;b""#));
    }
}

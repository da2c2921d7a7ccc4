//! Built-in circuit element table.

use tk_core::{ElementSpec, SpecTable};

/// Name, label, icon, drawing tag, default value.
type CatalogEntry = (&'static str, &'static str, &'static str, &'static str, &'static str);

const CATALOG: &[CatalogEntry] = &[
    ("resistor", "Resistor", "▭", "R", "1k"),
    ("euroresistor", "European Resistor", "▭", "european resistor", "1k"),
    ("usresistor", "American Resistor", "⏛", "american resistor", "1k"),
    ("potentiometer", "Potentiometer", "↗", "pR", "10k"),
    ("thermistor", "Thermistor", "θ", "thR", "10k"),
    ("fuse", "Fuse", "⊟", "fuse", "1A"),
    ("capacitor", "Capacitor", "∥", "C", "100nF"),
    ("capacitor_polar", "Polarized Capacitor", "±", "eC", "10uF"),
    ("inductor", "Inductor", "∿", "L", "1mH"),
    ("diode", "Diode", "▶", "D", ""),
    ("zener", "Zener Diode", "⊳", "zD", ""),
    ("led", "LED", "✦", "leD", ""),
    ("photodiode", "Photodiode", "☼", "pD", ""),
    ("schottky", "Schottky Diode", "▸", "sD", ""),
    ("vsource", "Voltage Source", "⊕", "V", "5V"),
    ("isource", "Current Source", "⊙", "I", "1mA"),
    ("battery", "Battery", "🔋", "battery1", "9V"),
    ("ammeter", "Ammeter", "Ⓐ", "ammeter", ""),
    ("voltmeter", "Voltmeter", "Ⓥ", "voltmeter", ""),
    ("lamp", "Lamp", "💡", "lamp", ""),
    ("switch_open", "Open Switch", "⌿", "nos", ""),
    ("switch_closed", "Closed Switch", "—", "ncs", ""),
    ("crystal", "Crystal", "◫", "piezoelectric", "16MHz"),
];

/// Returns the built-in table of two-terminal circuit elements.
///
/// Every entry spans `(0, 0)` to `(2, 0)` and carries a `value` and an empty
/// `label` default.
///
/// # Examples
///
/// ```
/// use tk_codegen::builtin_table;
///
/// let table = builtin_table();
/// assert_eq!(table.library, "circuittikz");
/// assert_eq!(table.entries["resistor"].tikz, "R");
/// ```
#[must_use]
pub fn builtin_table() -> SpecTable {
    CATALOG.iter().fold(
        SpecTable::default(),
        |table, &(name, label, icon, tikz, value)| {
            let spec = ElementSpec::new(label, icon, tikz)
                .with_default("x1", 0)
                .with_default("y1", 0)
                .with_default("x2", 2)
                .with_default("y2", 0)
                .with_default("value", value)
                .with_default("label", "");
            table.with_entry(name, spec)
        },
    )
}

#[cfg(test)]
mod tests {
    use tk_source::is_js_identifier;

    use super::*;

    #[test]
    fn test_catalog_size() {
        assert_eq!(builtin_table().len(), 23);
    }

    #[test]
    fn test_names_are_identifiers() {
        for (name, _) in builtin_table().iter() {
            assert!(is_js_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_covers_circuittikz_bipoles() {
        let table = builtin_table();
        let bipoles = [
            "ammeter", "capacitor", "capacitor_polar", "diode", "euroresistor", "fuse", "inductor",
            "isource", "potentiometer", "resistor", "switch_closed", "thermistor", "usresistor",
            "vsource", "zener",
        ];
        for name in bipoles {
            assert!(table.entries.contains_key(name), "{name}");
        }
    }

    #[test]
    fn test_defaults_order() {
        let table = builtin_table();
        let keys: Vec<_> = table.entries["capacitor"]
            .defaults
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["x1", "y1", "x2", "y2", "value", "label"]);
    }
}

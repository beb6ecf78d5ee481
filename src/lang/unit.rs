/// ## Units of measure
///
/// Each unit converts to the first unit of its category with
/// `metric = raw * a + b`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Distance,
    Temperature,
    Mass,
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Fixed,
    /// Displayed with a u, m, c or K prefix.
    Si,
    /// Displayed with the largest unit of the chain not above the value.
    Chain,
}

#[derive(Debug)]
pub struct Unit {
    pub name: &'static str,
    pub suffix: &'static str,
    pub scale: Scale,
    pub a: f64,
    pub b: f64,
}

macro_rules! unit {
    ($name:expr, $suffix:expr, $scale:ident, $a:expr, $b:expr) => {
        Unit {
            name: $name,
            suffix: $suffix,
            scale: Scale::$scale,
            a: $a,
            b: $b,
        }
    };
}

static DISTANCE: [Unit; 5] = [
    unit!("Meters", "m", Si, 1.0, 0.0),
    unit!("Inches", "in", Chain, 0.0254, 0.0),
    unit!("Feet", "ft", Chain, 0.3048, 0.0),
    unit!("Miles", "mi", Chain, 1609.344, 0.0),
    unit!("Points", "pt", Fixed, 0.0254 / 72.0, 0.0),
];

static TEMPERATURE: [Unit; 3] = [
    unit!("Celsius", "degC", Fixed, 1.0, 0.0),
    unit!("Fahrenheit", "degF", Fixed, 5.0 / 9.0, -5.0 * 32.0 / 9.0),
    unit!("Kelvin", "degK", Fixed, 1.0, -273.15),
];

static MASS: [Unit; 3] = [
    unit!("Gram", "g", Si, 1.0, 0.0),
    unit!("Pound", "Lb", Fixed, 453.59237, 0.0),
    unit!("Ounce", "oz", Fixed, 28.349523125, 0.0),
];

static ANGLE: [Unit; 2] = [
    unit!("Radians", "rad", Fixed, 1.0, 0.0),
    unit!("Degrees", "deg", Fixed, std::f64::consts::PI / 180.0, 0.0),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Distance,
        Category::Temperature,
        Category::Mass,
        Category::Angle,
    ];

    pub fn units(self) -> &'static [Unit] {
        match self {
            Category::Distance => &DISTANCE,
            Category::Temperature => &TEMPERATURE,
            Category::Mass => &MASS,
            Category::Angle => &ANGLE,
        }
    }
}

/// Category and position of a unit in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId {
    category: Category,
    index: u8,
}

impl UnitId {
    pub fn new(category: Category, index: usize) -> Option<UnitId> {
        if index < category.units().len() {
            Some(UnitId {
                category,
                index: index as u8,
            })
        } else {
            None
        }
    }

    pub fn category(self) -> Category {
        self.category
    }

    pub fn unit(self) -> &'static Unit {
        &self.category.units()[self.index as usize]
    }

    /// Packed as `(category + 1) << 4 | index` for expression blocks.
    pub fn to_byte(self) -> u8 {
        ((self.category as u8 + 1) << 4) | self.index
    }

    pub fn from_byte(byte: u8) -> Option<UnitId> {
        let category = *Category::ALL.get(((byte >> 4) as usize).checked_sub(1)?)?;
        UnitId::new(category, (byte & 15) as usize)
    }

    /// Unit whose suffix ends `word`, optionally preceded by one SI
    /// prefix letter. Returns the multiplier the prefix stands for.
    pub fn from_suffix(word: &str) -> Option<(UnitId, f64)> {
        for category in Category::ALL.iter() {
            for (index, unit) in category.units().iter().enumerate() {
                let len = unit.suffix.len();
                if word.len() != len && word.len() != len + 1 {
                    continue;
                }
                if !word[word.len() - len..].eq_ignore_ascii_case(unit.suffix) {
                    continue;
                }
                let mult = if word.len() == len {
                    1.0
                } else {
                    match word.as_bytes()[0].to_ascii_uppercase() {
                        b'U' => 1e-6,
                        b'M' => 1e-3,
                        b'C' => 1e-2,
                        b'K' => 1e3,
                        _ => continue,
                    }
                };
                return UnitId::new(*category, index).map(|id| (id, mult));
            }
        }
        None
    }

    /// Convert `value` expressed in this unit into `target`.
    pub fn convert(self, value: f64, target: UnitId) -> f64 {
        debug_assert_eq!(self.category, target.category);
        if self == target {
            return value;
        }
        let (from, to) = (self.unit(), target.unit());
        (value * from.a + from.b - to.b) / to.a
    }

    /// Number and suffix to show for `value`. The argument is never
    /// modified; scaling happens on the returned copy.
    pub fn display(self, value: f64) -> (f64, String) {
        let unit = self.unit();
        match unit.scale {
            Scale::Fixed => (value, unit.suffix.to_string()),
            Scale::Si => {
                let magnitude = value.abs();
                let (scaled, prefix) = if magnitude == 0.0 || !magnitude.is_finite() {
                    (value, None)
                } else if magnitude < 0.001 {
                    (value * 1e6, Some('u'))
                } else if magnitude < 0.01 {
                    (value * 1e3, Some('m'))
                } else if magnitude < 1.0 {
                    (value * 100.0, Some('c'))
                } else if magnitude > 1000.0 {
                    (value * 0.001, Some('K'))
                } else {
                    (value, None)
                };
                match prefix {
                    Some(p) => (scaled, format!("{}{}", p, unit.suffix)),
                    None => (scaled, unit.suffix.to_string()),
                }
            }
            Scale::Chain => {
                let units = self.category.units();
                let mut index = self.index as usize;
                let mut shown = value;
                while let Some(next) = units.get(index + 1) {
                    if next.scale != Scale::Chain {
                        break;
                    }
                    let candidate = shown * units[index].a / next.a;
                    if candidate.abs() < 1.0 {
                        break;
                    }
                    shown = candidate;
                    index += 1;
                }
                (shown, units[index].suffix.to_string())
            }
        }
    }
}

/// Unit every measure of a category is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultUnits {
    pub distance: UnitId,
    pub temperature: UnitId,
    pub mass: UnitId,
    pub angle: UnitId,
}

impl Default for DefaultUnits {
    fn default() -> DefaultUnits {
        DefaultUnits {
            distance: UnitId {
                category: Category::Distance,
                index: 0,
            },
            temperature: UnitId {
                category: Category::Temperature,
                index: 0,
            },
            mass: UnitId {
                category: Category::Mass,
                index: 0,
            },
            angle: UnitId {
                category: Category::Angle,
                index: 0,
            },
        }
    }
}

impl DefaultUnits {
    pub fn get(&self, category: Category) -> UnitId {
        match category {
            Category::Distance => self.distance,
            Category::Temperature => self.temperature,
            Category::Mass => self.mass,
            Category::Angle => self.angle,
        }
    }

    /// Make the unit with this exact suffix the default of its category.
    pub fn set(&mut self, suffix: &str) -> bool {
        for category in Category::ALL.iter() {
            for (index, unit) in category.units().iter().enumerate() {
                if unit.suffix.eq_ignore_ascii_case(suffix) {
                    let id = UnitId {
                        category: *category,
                        index: index as u8,
                    };
                    match category {
                        Category::Distance => self.distance = id,
                        Category::Temperature => self.temperature = id,
                        Category::Mass => self.mass = id,
                        Category::Angle => self.angle = id,
                    }
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(category: Category, index: usize) -> UnitId {
        UnitId::new(category, index).unwrap()
    }

    #[test]
    fn test_suffix() {
        let (unit, mult) = UnitId::from_suffix("cm").unwrap();
        assert_eq!(unit, id(Category::Distance, 0));
        assert_eq!(mult, 1e-2);
        let (unit, mult) = UnitId::from_suffix("mi").unwrap();
        assert_eq!(unit, id(Category::Distance, 3));
        assert_eq!(mult, 1.0);
        let (unit, _) = UnitId::from_suffix("LB").unwrap();
        assert_eq!(unit, id(Category::Mass, 1));
        let (unit, mult) = UnitId::from_suffix("kg").unwrap();
        assert_eq!(unit, id(Category::Mass, 0));
        assert_eq!(mult, 1e3);
        assert_eq!(UnitId::from_suffix("deg").unwrap().0, id(Category::Angle, 1));
        assert_eq!(UnitId::from_suffix("degF").unwrap().0, id(Category::Temperature, 1));
        assert!(UnitId::from_suffix("xm").is_none());
        assert!(UnitId::from_suffix("abc").is_none());
    }

    #[test]
    fn test_convert() {
        let f = id(Category::Temperature, 1);
        let c = id(Category::Temperature, 0);
        let k = id(Category::Temperature, 2);
        assert!((f.convert(212.0, c) - 100.0).abs() < 1e-9);
        assert!((k.convert(0.0, c) + 273.15).abs() < 1e-9);
        assert!((c.convert(100.0, f) - 212.0).abs() < 1e-9);
        let inch = id(Category::Distance, 1);
        let meter = id(Category::Distance, 0);
        assert!((inch.convert(100.0, meter) - 2.54).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let meter = id(Category::Distance, 0);
        assert_eq!(meter.display(0.005), (5.0, "mm".to_string()));
        assert_eq!(meter.display(2500.0), (2.5, "Km".to_string()));
        assert_eq!(meter.display(5.0), (5.0, "m".to_string()));
        assert_eq!(meter.display(0.0), (0.0, "m".to_string()));
        let inch = id(Category::Distance, 1);
        assert_eq!(inch.display(6.0), (6.0, "in".to_string()));
        let (feet, suffix) = inch.display(24.0);
        assert_eq!(suffix, "ft");
        assert!((feet - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_byte() {
        let unit = id(Category::Mass, 2);
        assert_eq!(UnitId::from_byte(unit.to_byte()), Some(unit));
        assert_eq!(UnitId::from_byte(0), None);
    }
}

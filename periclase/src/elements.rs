//! Tabulated atomic data used by the bond detection code.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Covalent radii in Ångström, indexed by atomic number (Cordero et al.,
/// Dalton Trans. 2008). Index 0 is a placeholder.
static COVALENT_RADII: [f64; 97] = [
    0.0,
    0.31, 0.28,                                                 // H, He
    1.28, 0.96, 0.84, 0.76, 0.71, 0.66, 0.57, 0.58,             // Li - Ne
    1.66, 1.41, 1.21, 1.11, 1.07, 1.05, 1.02, 1.06,             // Na - Ar
    2.03, 1.76,                                                 // K, Ca
    1.70, 1.60, 1.53, 1.39, 1.39, 1.32, 1.26, 1.24, 1.32, 1.22, // Sc - Zn
    1.22, 1.20, 1.19, 1.20, 1.20, 1.16,                         // Ga - Kr
    2.20, 1.95,                                                 // Rb, Sr
    1.90, 1.75, 1.64, 1.54, 1.47, 1.46, 1.42, 1.39, 1.45, 1.44, // Y - Cd
    1.42, 1.39, 1.39, 1.38, 1.39, 1.40,                         // In - Xe
    2.44, 2.15,                                                 // Cs, Ba
    2.07, 2.04, 2.03, 2.01, 1.99, 1.98, 1.98, 1.96, 1.94, 1.92, // La - Dy
    1.92, 1.89, 1.90, 1.87, 1.87,                               // Ho - Lu
    1.75, 1.70, 1.62, 1.51, 1.44, 1.41, 1.36, 1.36, 1.32,       // Hf - Hg
    1.45, 1.46, 1.48, 1.40, 1.50, 1.50,                         // Tl - Rn
    2.60, 2.21,                                                 // Fr, Ra
    2.15, 2.06, 2.00, 1.96, 1.90, 1.87, 1.80, 1.69,             // Ac - Cm
];

/// Element symbols, indexed by atomic number.
static SYMBOLS: [&str; 97] = [
    "X",
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm",
];

static SYMBOL_TO_NUMBER: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    SYMBOLS.iter()
        .enumerate()
        .skip(1)
        .map(|(i, &symbol)| (symbol, i as i32))
        .collect()
});

/// Get the covalent radius (in Ångström) of the element with the given
/// atomic number, or `None` if the element is not tabulated.
pub fn covalent_radius(atomic_number: i32) -> Option<f64> {
    if atomic_number < 1 || atomic_number as usize >= COVALENT_RADII.len() {
        return None;
    }
    Some(COVALENT_RADII[atomic_number as usize])
}

/// Get the atomic number corresponding to an element symbol, e.g. `"Si"`.
pub fn atomic_number(symbol: &str) -> Option<i32> {
    SYMBOL_TO_NUMBER.get(symbol).copied()
}

/// Get the symbol of the element with the given atomic number.
pub fn symbol(atomic_number: i32) -> Option<&'static str> {
    if atomic_number < 1 || atomic_number as usize >= SYMBOLS.len() {
        return None;
    }
    Some(SYMBOLS[atomic_number as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radii() {
        assert_eq!(covalent_radius(1), Some(0.31));
        assert_eq!(covalent_radius(6), Some(0.76));
        assert_eq!(covalent_radius(14), Some(1.11));
        assert_eq!(covalent_radius(0), None);
        assert_eq!(covalent_radius(-3), None);
        assert_eq!(covalent_radius(200), None);
    }

    #[test]
    fn symbols() {
        assert_eq!(atomic_number("H"), Some(1));
        assert_eq!(atomic_number("Fe"), Some(26));
        assert_eq!(atomic_number("Uuo"), None);
        assert_eq!(symbol(26), Some("Fe"));
        assert_eq!(symbol(104), None);
    }
}

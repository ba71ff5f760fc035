//! Test utilities and fixtures for SD-file parser testing
//!
//! This module provides record builders shared by the splitter and record
//! parser tests.


/// Atom line for a carbon at the origin
pub const CARBON_ATOM_LINE: &str =
    "    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0";

/// Build a V2000 record block (terminator excluded)
pub fn v2000_block(title: &str, atoms: usize, bonds: usize, properties: &[(&str, &str)]) -> String {
    let mut block = String::new();
    block.push_str(title);
    block.push('\n');
    block.push_str("  SdfTest 01012500002D\n");
    block.push('\n');
    block.push_str(&format!(
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000\n",
        atoms, bonds
    ));
    for _ in 0..atoms {
        block.push_str(CARBON_ATOM_LINE);
        block.push('\n');
    }
    for i in 0..bonds {
        block.push_str(&format!("{:>3}{:>3}  1  0\n", i + 1, i + 2));
    }
    block.push_str("M  END\n");
    for (name, value) in properties {
        block.push_str(&format!("> <{}>\n{}\n\n", name, value));
    }
    block
}

/// Build a complete V2000 SD entry including the `$$$$` terminator
pub fn v2000_entry(title: &str, atoms: usize, bonds: usize, properties: &[(&str, &str)]) -> String {
    format!("{}$$$$\n", v2000_block(title, atoms, bonds, properties))
}

/// Build a V3000 record block (terminator excluded)
pub fn v3000_block(title: &str, atoms: usize, bonds: usize) -> String {
    let mut block = format!(
        "{}\n  SdfTest 01012500002D\n\n  0  0  0     0  0            999 V3000\n",
        title
    );
    block.push_str("M  V30 BEGIN CTAB\n");
    block.push_str(&format!("M  V30 COUNTS {} {} 0 0 0\n", atoms, bonds));
    block.push_str("M  V30 BEGIN ATOM\n");
    for i in 0..atoms {
        block.push_str(&format!("M  V30 {} C 0.0 0.0 0.0 0\n", i + 1));
    }
    block.push_str("M  V30 END ATOM\n");
    block.push_str("M  V30 BEGIN BOND\n");
    for i in 0..bonds {
        block.push_str(&format!("M  V30 {} 1 {} {}\n", i + 1, i + 1, i + 2));
    }
    block.push_str("M  V30 END BOND\n");
    block.push_str("M  V30 END CTAB\n");
    block.push_str("M  END\n");
    block
}

//! Bodies of the parser stubs created by the default layout plan.

pub(crate) const PARSE_PROJECT_CODE: &str = "\
// Parsing orchestrator, dispatching on the project language.
// Delegates to the language-specific parsers (TikZ, CircuitTikZ, ...).

import { parseTikz } from './parseTikz'
import { parseCircuitikz } from './parseCircuitikz'

/**
 * Routes the code to the parser matching projectType.
 * Returns a list of elements ready for the store.
 */
export function parseProjectCode(projectType, code) {
  if (projectType === 'circuitikz') {
    return parseCircuitikz(code)
  }
  // default: plain TikZ
  return parseTikz(code)
}
";

pub(crate) const PARSE_TIKZ: &str = "\
// TikZ parser.
// TODO: implement real parsing; returns no elements for now.

export function parseTikz(code) {
  // Returns an array of elements in the store format:
  // [{ type, x, y, ... }]
  return []
}
";

pub(crate) const PARSE_CIRCUITIKZ: &str = "\
// CircuiTikZ parser.
// TODO: implement real parsing; returns no elements for now.

export function parseCircuitikz(code) {
  // Returns an array of CircuiTikZ elements in the store format.
  return []
}
";

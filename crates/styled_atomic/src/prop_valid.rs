//! Which props a DOM element accepts, in the manner of `@emotion/is-prop-valid`.

use std::collections::HashSet;

use once_cell::sync::Lazy;

const DOM_PROPS: &[&str] = &[
  // React
  "children", "dangerouslySetInnerHTML", "key", "ref", "autoFocus", "defaultValue",
  "defaultChecked", "innerHTML", "suppressContentEditableWarning",
  "suppressHydrationWarning", "valueLink",
  // HTML attributes
  "accept", "acceptCharset", "accessKey", "action", "allow", "allowFullScreen",
  "alt", "as", "async", "autoCapitalize", "autoComplete", "autoCorrect", "autoPlay",
  "capture", "cellPadding", "cellSpacing", "charSet", "checked", "cite", "className",
  "cols", "colSpan", "content", "contentEditable", "contextMenu", "controls",
  "controlsList", "coords", "crossOrigin", "data", "dateTime", "decoding", "default",
  "defer", "dir", "disabled", "disablePictureInPicture", "download", "draggable",
  "encType", "enterKeyHint", "fetchPriority", "form", "formAction", "formEncType",
  "formMethod", "formNoValidate", "formTarget", "frameBorder", "headers", "height",
  "hidden", "high", "href", "hrefLang", "htmlFor", "httpEquiv", "id", "inert",
  "inputMode", "integrity", "is", "itemID", "itemProp", "itemRef", "itemScope",
  "itemType", "kind", "label", "lang", "list", "loading", "loop", "low", "manifest",
  "marginHeight", "marginWidth", "max", "maxLength", "media", "mediaGroup", "method",
  "min", "minLength", "multiple", "muted", "name", "nonce", "noValidate", "open",
  "optimum", "pattern", "placeholder", "playsInline", "popover", "popoverTarget",
  "popoverTargetAction", "poster", "preload", "profile", "radioGroup", "readOnly",
  "referrerPolicy", "rel", "required", "reversed", "role", "rows", "rowSpan",
  "sandbox", "scope", "scoped", "scrolling", "seamless", "selected", "shape", "size",
  "sizes", "slot", "span", "spellCheck", "src", "srcDoc", "srcLang", "srcSet", "start",
  "step", "style", "summary", "tabIndex", "target", "title", "translate", "type",
  "useMap", "value", "width", "wmode", "wrap",
  // SVG
  "clipPath", "cx", "cy", "d", "fill", "fillOpacity", "fillRule", "filter", "fontFamily",
  "fontSize", "fx", "fy", "gradientTransform", "gradientUnits", "markerEnd",
  "markerMid", "markerStart", "mask", "offset", "opacity", "points", "preserveAspectRatio",
  "r", "rx", "ry", "stopColor", "stopOpacity", "stroke", "strokeDasharray",
  "strokeLinecap", "strokeLinejoin", "strokeOpacity", "strokeWidth", "textAnchor",
  "transform", "version", "viewBox", "x", "x1", "x2", "xmlns", "xmlnsXlink", "y", "y1",
  "y2",
];

static DOM_PROP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| DOM_PROPS.iter().copied().collect());

/// `data-*`, `aria-*` and `x-*`, any case for the prefix.
fn is_prefixed_attribute(prop: &str) -> bool {
  ["data-", "aria-", "x-"].iter().any(|prefix| {
    prop.len() > prefix.len()
      && prop
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
  })
}

/// `onClick`, `onMouseEnter`, ...
fn is_event_handler(prop: &str) -> bool {
  prop
    .strip_prefix("on")
    .and_then(|rest| rest.chars().next())
    .is_some_and(|first| first.is_ascii_uppercase())
}

pub fn is_prop_valid(prop: &str) -> bool {
  !prop.is_empty() && (DOM_PROP_SET.contains(prop) || is_prefixed_attribute(prop) || is_event_handler(prop))
}

#[cfg(test)]
mod tests {
  use super::is_prop_valid;

  #[test]
  fn test_known_dom_props() {
    assert!(is_prop_valid("children"));
    assert!(is_prop_valid("className"));
    assert!(is_prop_valid("disabled"));
  }

  #[test]
  fn test_prefixed_attributes() {
    assert!(is_prop_valid("data-testid"));
    assert!(is_prop_valid("ARIA-label"));
    assert!(is_prop_valid("x-custom"));
    assert!(!is_prop_valid("data-"));
  }

  #[test]
  fn test_event_handlers() {
    assert!(is_prop_valid("onClick"));
    assert!(!is_prop_valid("onlower"));
    assert!(!is_prop_valid("on"));
  }

  #[test]
  fn test_style_props_are_rejected() {
    assert!(!is_prop_valid("variant"));
    assert!(!is_prop_valid("isActive"));
    assert!(!is_prop_valid("$size"));
    assert!(!is_prop_valid(""));
  }
}

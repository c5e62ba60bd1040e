//! Built-in externs for the ECMAScript standard library and common browser
//! APIs. Always merged, so calls like `console.log` survive renaming without
//! user configuration.

use std::sync::OnceLock;

use super::{ExternDeclaration, parse_externs};

const DEFAULT_EXTERNS: &str = r#"
var undefined;
var NaN;
var Infinity;
var globalThis = {};
var window = {};
var self = {};
var document = {};
var navigator = {};
var location = {};
var history = {};
var localStorage = {};
var sessionStorage = {};
var console = {};
var Math = {};
var JSON = {};
var Reflect = {};
var Intl = {};

function Object() {}
function Array() {}
function String() {}
function Number() {}
function Boolean() {}
function Symbol() {}
function BigInt() {}
function Date() {}
function RegExp() {}
function Error() {}
function TypeError() {}
function RangeError() {}
function ReferenceError() {}
function SyntaxError() {}
function Promise() {}
function Map() {}
function Set() {}
function WeakMap() {}
function WeakSet() {}
function Proxy() {}
function URL() {}
function URLSearchParams() {}
function Event() {}
function CustomEvent() {}
function XMLHttpRequest() {}
function FormData() {}
function Headers() {}
function Request() {}
function Response() {}
function HTMLElement() {}
function Element() {}
function Node() {}
function parseInt() {}
function parseFloat() {}
function isNaN() {}
function isFinite() {}
function encodeURIComponent() {}
function decodeURIComponent() {}
function encodeURI() {}
function decodeURI() {}
function setTimeout() {}
function clearTimeout() {}
function setInterval() {}
function clearInterval() {}
function requestAnimationFrame() {}
function cancelAnimationFrame() {}
function fetch() {}
function alert() {}
function confirm() {}
function prompt() {}
function queueMicrotask() {}

Object.prototype.constructor;
Object.prototype.toString;
Object.prototype.valueOf;
Object.prototype.hasOwnProperty;
Object.prototype.__proto__;
Object.assign = function() {};
Object.keys = function() {};
Object.values = function() {};
Object.entries = function() {};
Object.freeze = function() {};
Object.create = function() {};
Object.defineProperty = function() {};
Function.prototype.call = function() {};
Function.prototype.apply = function() {};
Function.prototype.bind = function() {};
Function.prototype.name;
Function.prototype.length;

Array.isArray = function() {};
Array.from = function() {};
Array.of = function() {};
Array.prototype.length;
Array.prototype.push = function() {};
Array.prototype.pop = function() {};
Array.prototype.shift = function() {};
Array.prototype.unshift = function() {};
Array.prototype.slice = function() {};
Array.prototype.splice = function() {};
Array.prototype.concat = function() {};
Array.prototype.join = function() {};
Array.prototype.reverse = function() {};
Array.prototype.sort = function() {};
Array.prototype.indexOf = function() {};
Array.prototype.lastIndexOf = function() {};
Array.prototype.includes = function() {};
Array.prototype.find = function() {};
Array.prototype.findIndex = function() {};
Array.prototype.filter = function() {};
Array.prototype.map = function() {};
Array.prototype.forEach = function() {};
Array.prototype.reduce = function() {};
Array.prototype.some = function() {};
Array.prototype.every = function() {};
Array.prototype.flat = function() {};
Array.prototype.flatMap = function() {};
Array.prototype.fill = function() {};

String.prototype.charAt = function() {};
String.prototype.charCodeAt = function() {};
String.prototype.split = function() {};
String.prototype.substring = function() {};
String.prototype.toLowerCase = function() {};
String.prototype.toUpperCase = function() {};
String.prototype.trim = function() {};
String.prototype.replace = function() {};
String.prototype.startsWith = function() {};
String.prototype.endsWith = function() {};
String.prototype.padStart = function() {};
String.prototype.repeat = function() {};
String.prototype.match = function() {};
Number.prototype.toFixed = function() {};
RegExp.prototype.test = function() {};
RegExp.prototype.exec = function() {};
RegExp.prototype.source;

Math.abs = function() {};
Math.floor = function() {};
Math.ceil = function() {};
Math.round = function() {};
Math.max = function() {};
Math.min = function() {};
Math.pow = function() {};
Math.sqrt = function() {};
Math.random = function() {};
Math.PI;
JSON.parse = function() {};
JSON.stringify = function() {};
Date.now = function() {};
Date.prototype.getTime = function() {};
Date.prototype.toISOString = function() {};

Promise.resolve = function() {};
Promise.reject = function() {};
Promise.all = function() {};
Promise.prototype.then = function() {};
Promise.prototype.catch = function() {};
Promise.prototype.finally = function() {};
Map.prototype.get = function() {};
Map.prototype.set = function() {};
Map.prototype.has = function() {};
Map.prototype.delete = function() {};
Map.prototype.clear = function() {};
Map.prototype.size;
Error.prototype.message;
Error.prototype.stack;

console.log = function() {};
console.info = function() {};
console.warn = function() {};
console.error = function() {};
console.debug = function() {};

document.body;
document.head;
document.title;
document.cookie;
document.getElementById = function() {};
document.getElementsByClassName = function() {};
document.querySelector = function() {};
document.querySelectorAll = function() {};
document.createElement = function() {};
document.createTextNode = function() {};
Element.prototype.id;
Element.prototype.innerHTML;
Element.prototype.textContent;
Element.prototype.value;
Element.prototype.checked;
Element.prototype.style;
Element.prototype.className;
Element.prototype.classList;
Element.prototype.children;
Element.prototype.parentNode;
Element.prototype.dataset;
Element.prototype.appendChild = function() {};
Element.prototype.removeChild = function() {};
Element.prototype.replaceChild = function() {};
Element.prototype.insertBefore = function() {};
Element.prototype.setAttribute = function() {};
Element.prototype.getAttribute = function() {};
Element.prototype.removeAttribute = function() {};
Element.prototype.addEventListener = function() {};
Element.prototype.removeEventListener = function() {};
Element.prototype.focus = function() {};
Element.prototype.add = function() {};
Element.prototype.remove = function() {};
Element.prototype.toggle = function() {};
Element.prototype.contains = function() {};
Event.prototype.target;
Event.prototype.type;
Event.prototype.keyCode;
Event.prototype.key;
Event.prototype.preventDefault = function() {};
Event.prototype.stopPropagation = function() {};
window.addEventListener = function() {};
window.onload;
location.href;
location.hash;
location.pathname;
location.search;
history.pushState = function() {};
history.replaceState = function() {};
localStorage.getItem = function() {};
localStorage.setItem = function() {};
localStorage.removeItem = function() {};

XMLHttpRequest.prototype.open = function() {};
XMLHttpRequest.prototype.send = function() {};
XMLHttpRequest.prototype.setRequestHeader = function() {};
XMLHttpRequest.prototype.onload;
XMLHttpRequest.prototype.onreadystatechange;
XMLHttpRequest.prototype.readyState;
XMLHttpRequest.prototype.status;
XMLHttpRequest.prototype.responseText;
Response.prototype.ok;
Response.prototype.json = function() {};
Response.prototype.text = function() {};
"#;

/// Parsed built-in declarations, computed once per process.
pub(super) fn declarations() -> &'static [ExternDeclaration] {
  static DECLARATIONS: OnceLock<Vec<ExternDeclaration>> = OnceLock::new();
  DECLARATIONS.get_or_init(|| parse_externs(DEFAULT_EXTERNS).unwrap_or_default())
}

use std::time::{Duration, Instant};

use super::*;
use crate::runtime::dom;
use crate::runtime::intrinsics::inspect;
use crate::runtime::scope::FunctionFrame;

/// Deep recursion tests need more than the default test-thread stack.
fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .map(|handle| handle.join())
        .expect("spawn test thread")
        .expect("test thread panicked")
}

fn run_with(source: &'static str, limits: Limits, with_dom: bool) -> String {
    on_big_stack(move || {
        let program = proctor_syntax::parse_source(source).expect("test source should parse");
        let mut it = Interpreter::new(limits, InterruptHandle::new()).expect("realm");
        if with_dom {
            dom::install(&mut it).expect("dom");
        }
        let scope = Scope::function(it.global_scope(), FunctionFrame::default());
        match it.run_program(&program, &scope) {
            Ok(value) => inspect(&it, &value),
            Err(Abrupt::Throw(value)) => {
                let shown = match &value {
                    Value::Object(_) => inspect(&it, &value),
                    other => other.primitive_to_string().to_string(),
                };
                format!("Uncaught {shown}")
            }
            Err(Abrupt::Interrupt(interrupt)) => format!("Interrupted {interrupt:?}"),
        }
    })
}

fn run(source: &'static str) -> String {
    run_with(source, Limits::default(), false)
}

fn run_dom(source: &'static str) -> String {
    run_with(source, Limits::default(), true)
}

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(run("return 1 + 2 * 3 - 4 / 2"), "5");
    assert_eq!(run("return 2 ** 3 ** 2"), "512");
    assert_eq!(run("return 7 % 3 + (-7 % 3)"), "0");
    assert_eq!(run("return '3' * '4'"), "12");
    assert_eq!(run("return 1 + '2'"), "12");
    assert_eq!(run("return 0.1 + 0.2"), "0.30000000000000004");
    assert_eq!(run("return 5 / 0"), "Infinity");
    assert_eq!(run("return (-8) >> 1"), "-4");
    assert_eq!(run("return -1 >>> 28"), "15");
}

#[test]
fn test_equality_and_typeof() {
    assert_eq!(run("return [1 == '1', 1 === '1', null == undefined, null === undefined, NaN === NaN]"),
        "[ true, false, true, false, false ]");
    assert_eq!(run("return [typeof 1, typeof 'a', typeof null, typeof undefined, typeof {}, typeof (() => 1)]"),
        "[ 'number', 'string', 'object', 'undefined', 'object', 'function' ]");
    assert_eq!(run("return typeof notDeclared"), "undefined");
}

#[test]
fn test_let_const_and_tdz() {
    assert_eq!(run("const x = 1; x = 2"), "Uncaught TypeError: Assignment to constant variable.");
    assert_eq!(run("x; let x = 1"), "Uncaught ReferenceError: Cannot access 'x' before initialization");
    assert_eq!(run("return y"), "Uncaught ReferenceError: y is not defined");
    assert_eq!(run("var a = 1; { var a = 2 } return a"), "2");
    assert_eq!(run("let a = 1; { let a = 2 } return a"), "1");
}

#[test]
fn test_function_hoisting_and_closures() {
    assert_eq!(run("return f(); function f() { return 'hoisted' }"), "hoisted");
    assert_eq!(
        run("function counter() { let n = 0; return () => ++n } const c = counter(); c(); c(); return c()"),
        "3"
    );
    assert_eq!(
        run("const fns = []; for (let i = 0; i < 3; i++) fns.push(() => i); return fns.map(f => f())"),
        "[ 0, 1, 2 ]"
    );
}

#[test]
fn test_default_rest_and_destructuring() {
    assert_eq!(run("function f(a, b = a * 2, ...rest) { return [a, b, rest] } return f(1)"), "[ 1, 2, [] ]");
    assert_eq!(run("const { a, b: { c = 5 } = {}, ...others } = { a: 1, d: 4, e: 5 }; return [a, c, others]"),
        "[ 1, 5, { d: 4, e: 5 } ]");
    assert_eq!(run("const [x, , y = 3, ...zs] = [1, 2, undefined, 4, 5]; return [x, y, zs]"),
        "[ 1, 3, [ 4, 5 ] ]");
    assert_eq!(run("let a = 1, b = 2; [a, b] = [b, a]; return [a, b]"), "[ 2, 1 ]");
    assert_eq!(run("const { a } = null"), "Uncaught TypeError: Cannot destructure property 'a' of 'null' as it is null.");
}

#[test]
fn test_spread_and_object_literals() {
    assert_eq!(run("const a = [1, 2]; return [0, ...a, 3]"), "[ 0, 1, 2, 3 ]");
    assert_eq!(run("return Math.max(...[4, 9, 2])"), "9");
    assert_eq!(run("const k = 'dyn'; return { [k + 1]: true, ...{ x: 1 }, x: 2 }"), "{ dyn1: true, x: 2 }");
    assert_eq!(run("const name = 'n'; const o = { name, greet() { return 'hi ' + this.name } }; return o.greet()"),
        "hi n");
}

#[test]
fn test_optional_chaining_and_nullish() {
    assert_eq!(run("const o = null; return o?.a.b.c"), "undefined");
    assert_eq!(run("const o = { f: null }; return o.f?.()"), "undefined");
    assert_eq!(run("return [null ?? 'd', 0 ?? 'd', 0 || 'd', '' && 'x']"), "[ 'd', 0, 'd', '' ]");
    assert_eq!(run("let a = null; a ??= 5; let b = 1; b ||= 9; b &&= 7; return [a, b]"), "[ 5, 7 ]");
    assert_eq!(run("const o = undefined; return o.x"),
        "Uncaught TypeError: Cannot read properties of undefined (reading 'x')");
}

#[test]
fn test_control_flow() {
    assert_eq!(
        run("let out = ''; outer: for (let i = 0; i < 3; i++) { for (let j = 0; j < 3; j++) { if (j == 1) continue outer; if (i == 2) break outer; out += i + '' + j } } return out"),
        "0010"
    );
    assert_eq!(
        run("function f(x) { switch (x) { case 1: return 'one'; case 2: case 3: return 'few'; default: return 'many' } } return [f(1), f(3), f(9)]"),
        "[ 'one', 'few', 'many' ]"
    );
    assert_eq!(run("let n = 0; do { n++ } while (n < 5); return n"), "5");
    assert_eq!(run("const keys = []; for (const k in { a: 1, b: 2 }) keys.push(k); return keys"), "[ 'a', 'b' ]");
    assert_eq!(run("let s = 0; for (const v of [1, 2, 3]) s += v; return s"), "6");
    assert_eq!(run("let s = ''; for (const c of 'ab') s = c + s; return s"), "ba");
}

#[test]
fn test_exceptions() {
    assert_eq!(
        run("try { throw new TypeError('bad') } catch (e) { return [e instanceof TypeError, e instanceof Error, e.name, e.message] }"),
        "[ true, true, 'TypeError', 'bad' ]"
    );
    assert_eq!(run("const log = []; try { log.push(1) } finally { log.push(2) } return log"), "[ 1, 2 ]");
    assert_eq!(run("function f() { try { return 'try' } finally { return 'finally' } } return f()"), "finally");
    assert_eq!(run("try { null.x } catch { return 'caught' }"), "caught");
    assert_eq!(run("throw 'plain'"), "Uncaught plain");
    assert_eq!(run("undefinedFn()"), "Uncaught ReferenceError: undefinedFn is not defined");
    assert_eq!(run("const o = {}; o.missing()"), "Uncaught TypeError: o.missing is not a function");
}

#[test]
fn test_classes() {
    assert_eq!(
        run(r#"
            class Animal {
                constructor(name) { this.name = name }
                speak() { return this.name + ' makes a sound' }
                static create(name) { return new this(name) }
            }
            class Dog extends Animal {
                speak() { return super.speak() + ' (woof)' }
            }
            const d = Dog.create('Rex');
            return [d.speak(), d instanceof Animal, Object.getPrototypeOf(d) === Dog.prototype]
        "#),
        "[ 'Rex makes a sound (woof)', true, true ]"
    );
    assert_eq!(run("class A {} A()"), "Uncaught TypeError: Class constructor A cannot be invoked without 'new'");
    assert_eq!(
        run("class A { constructor() { this.x = 1 } } class B extends A { constructor() { this.y = 2; super() } } new B()"),
        "Uncaught ReferenceError: Must call super constructor in derived class before accessing 'this' or returning from derived constructor"
    );
    assert_eq!(run("class Counter { count = 0; inc() { return ++this.count } } const c = new Counter(); c.inc(); return c.inc()"), "2");
}

#[test]
fn test_this_binding() {
    assert_eq!(run("const o = { v: 1, f() { return [1].map(() => this.v) } }; return o.f()"), "[ 1 ]");
    assert_eq!(run("function f() { return this } return f()"), "undefined");
    assert_eq!(run("const o = { v: 3 }; function g() { return this.v } return g.call(o) + g.bind(o)()"), "6");
}

#[test]
fn test_template_literals() {
    assert_eq!(run("const n = 3; return `n = ${n}, twice = ${n * 2}`"), "n = 3, twice = 6");
    assert_eq!(run("return `${[1, 2]}|${{}}|${null}`"), "1,2|[object Object]|null");
}

#[test]
fn test_array_methods() {
    assert_eq!(run("return [3, 1, 10, 2].sort()"), "[ 1, 10, 2, 3 ]");
    assert_eq!(run("return [3, 1, 10, 2].sort((a, b) => a - b)"), "[ 1, 2, 3, 10 ]");
    assert_eq!(run("return [1, 2, 3, 4].filter(x => x % 2).map(x => x * 10)"), "[ 10, 30 ]");
    assert_eq!(run("return [1, 2, 3].reduce((a, b) => a + b, 10)"), "16");
    assert_eq!(run("return [].reduce((a, b) => a + b)"),
        "Uncaught TypeError: Reduce of empty array with no initial value");
    assert_eq!(run("return [1, [2, [3, [4]]]].flat(2)"), "[ 1, 2, 3, [ 4 ] ]");
    assert_eq!(run("const a = [1, 2, 3, 4, 5]; const removed = a.splice(1, 2, 'x'); return [a, removed]"),
        "[ [ 1, 'x', 4, 5 ], [ 2, 3 ] ]");
    assert_eq!(run("return [NaN].includes(NaN) && [NaN].indexOf(NaN) === -1"), "true");
    assert_eq!(run("const a = []; a[3] = 1; return a.length"), "4");
    assert_eq!(run("const a = [1, 2, 3]; a.length = 1; return a"), "[ 1 ]");
    assert_eq!(run("return Array.from({ length: 3 }, (_, i) => i * i)"), "[ 0, 1, 4 ]");
}

#[test]
fn test_string_methods() {
    assert_eq!(run("return 'a-b-c'.split('-')"), "[ 'a', 'b', 'c' ]");
    assert_eq!(run("return '  pad '.trim().padStart(5, '*')"), "**pad");
    assert_eq!(run("return 'Hello'.at(-1) + 'Hello'.slice(1, -1)"), "oell");
    assert_eq!(run("return 'aXbXc'.replaceAll('X', (m) => m.toLowerCase())"), "axbxc");
    assert_eq!(run("return 'abc'.repeat(-1)"), "Uncaught RangeError: Invalid count value: -1");
    assert_eq!(run("return '😀'.length"), "2");
}

#[test]
fn test_object_and_json() {
    assert_eq!(run("return Object.keys({ b: 1, a: 2 })"), "[ 'b', 'a' ]");
    assert_eq!(run("return Object.entries({ x: 1 })"), "[ [ 'x', 1 ] ]");
    assert_eq!(run("const o = Object.freeze({ a: 1 }); try { o.a = 2 } catch (e) { return [o.a, e instanceof TypeError] }"), "[ 1, true ]");
    assert_eq!(run("return JSON.stringify({ a: [1, 'two', null, undefined], b: undefined, c: () => 1 })"),
        r#"{"a":[1,"two",null,null]}"#);
    assert_eq!(run("return JSON.parse('{\"x\": [1, 2, {\"y\": true}]}').x[2].y"), "true");
    assert_eq!(run("const o = {}; o.self = o; return JSON.stringify(o)"),
        "Uncaught TypeError: Converting circular structure to JSON");
    assert_eq!(run("return JSON.stringify({ a: 1, b: [2] }, null, 2)"), "{\n  \"a\": 1,\n  \"b\": [\n    2\n  ]\n}");
}

#[test]
fn test_number_formatting() {
    assert_eq!(run("return [(1.005).toFixed(2), (255).toString(16), Number('  42 '), parseInt('08'), parseFloat('3.5px')]"),
        "[ '1.00', 'ff', 42, 8, 3.5 ]");
    assert_eq!(run("return [1e21, 1e-7, -0, 123456789012]"), "[ 1e+21, 1e-7, 0, 123456789012 ]");
}

#[test]
fn test_call_depth_is_a_catchable_range_error() {
    assert_eq!(
        run("function f() { return f() } try { f() } catch (e) { return e.name + ': ' + e.message }"),
        "RangeError: Maximum call stack size exceeded"
    );
}

#[test]
fn test_deadline_interrupts_infinite_loop() {
    let limits = Limits {
        deadline: Some(Instant::now() + Duration::from_millis(50)),
        ..Limits::default()
    };
    assert_eq!(run_with("while (true) {}", limits, false), "Interrupted Timeout");
}

#[test]
fn test_interrupt_cannot_be_caught() {
    let limits = Limits {
        deadline: Some(Instant::now() + Duration::from_millis(50)),
        ..Limits::default()
    };
    assert_eq!(
        run_with("for (;;) { try { while (true) {} } catch (e) {} finally {} }", limits, false),
        "Interrupted Timeout"
    );
}

#[test]
fn test_string_growth_is_capped() {
    let limits = Limits {
        max_string_len: 1024,
        ..Limits::default()
    };
    assert_eq!(
        run_with("let s = 'x'; while (true) s += s", limits, false),
        "Uncaught RangeError: Invalid string length"
    );
}

#[test]
fn test_math_random_is_deterministic() {
    let first = run("return [Math.random(), Math.random()]");
    assert_eq!(first, run("return [Math.random(), Math.random()]"));
    assert_eq!(run("const r = Math.random(); return r >= 0 && r < 1"), "true");
}

#[test]
fn test_dom_tree_and_text() {
    assert_eq!(
        run_dom(r#"
            const list = document.createElement('ul');
            for (const label of ['a', 'b']) {
                const li = document.createElement('li');
                li.textContent = label;
                list.appendChild(li);
            }
            return [list.children.length, list.firstChild.textContent, list.textContent, list.tagName]
        "#),
        "[ 2, 'a', 'ab', 'UL' ]"
    );
    assert_eq!(
        run_dom("const d = document.createElement('div'); d.appendChild(d)"),
        "Uncaught Error: Failed to execute 'appendChild' on 'Node': The new child element contains the parent."
    );
}

#[test]
fn test_dom_events() {
    assert_eq!(
        run_dom(r#"
            const button = document.createElement('button');
            const wrapper = document.createElement('div');
            wrapper.appendChild(button);
            const log = [];
            button.addEventListener('click', () => log.push('listener'));
            button.onclick = () => log.push('handler');
            wrapper.addEventListener('click', (e) => log.push('bubbled:' + e.target.tagName));
            button.click();
            return log
        "#),
        "[ 'handler', 'listener', 'bubbled:BUTTON' ]"
    );
    assert_eq!(run_dom("const b = document.createElement('button'); return b.onclick"), "null");
}

#[test]
fn test_dom_attributes_and_selectors() {
    assert_eq!(
        run_dom(r#"
            const root = document.createElement('section');
            const a = document.createElement('a');
            a.href = '/home';
            a.className = 'nav active';
            a.setAttribute('data-id', '7');
            root.appendChild(a);
            return [a.getAttribute('href'), a.classList.contains('active'), root.querySelector('section > a.nav') === a,
                root.querySelectorAll('[data-id="7"]').length, a.getAttribute('missing')]
        "#),
        "[ '/home', true, true, 1, null ]"
    );
    assert_eq!(
        run_dom("const d = document.createElement('div'); d.innerHTML = '<b>x</b>'"),
        "Uncaught TypeError: Setting innerHTML to markup is not supported; build nodes with document.createElement"
    );
}

#[test]
fn test_dom_serialization_is_escaped() {
    assert_eq!(
        run_dom(r#"
            const p = document.createElement('p');
            p.textContent = '<script>alert(1)</script>';
            p.setAttribute('onclick', 'steal()');
            p.style.backgroundColor = 'red';
            return p.outerHTML
        "#),
        r#"<p style="background-color: red;">&lt;script&gt;alert(1)&lt;/script&gt;</p>"#
    );
}

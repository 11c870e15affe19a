use indoc::indoc;

use super::AssemblyFile;
use crate::pipeline::Compiler;

fn compile(source: &str) -> Vec<AssemblyFile> {
    let unit = Compiler::new(source).parse().analyze().optimize();
    assert!(
        unit.is_valid(),
        "unexpected diagnostics: {}",
        unit.diagnostics().printer().render()
    );
    unit.emit().expect("emission succeeds on valid input")
}

fn file<'a>(files: &'a [AssemblyFile], name: &str) -> &'a str {
    &files
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no file named {}", name))
        .text
}

#[test]
fn field_and_constructor() {
    let files = compile("class SimpleClass is var value : Integer(42) this() is end end");
    assert_eq!(files.len(), 1);
    assert_eq!(
        file(&files, "SimpleClass.assembly"),
        indoc! {"
            .class public SimpleClass
            .super java/lang/Object
            .field public value I

            .method public <init>()V
                .limit stack 2
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                aload_0
                bipush 42
                putfield SimpleClass/value I
                return
            .end method
        "}
    );
}

#[test]
fn inheritance_chains_the_base_constructor() {
    let files = compile(indoc! {"
        class Base is
            var x : Integer(10)
            method getValue() : Integer is
                return x
            end
            this() is end
        end
        class Derived extends Base is
            var y : Integer(20)
            this() is end
        end
    "});
    assert_eq!(files.len(), 2);
    assert_eq!(
        file(&files, "Base.assembly"),
        indoc! {"
            .class public Base
            .super java/lang/Object
            .field public x I

            .method public getValue()I
                .limit stack 1
                .limit locals 1
                aload_0
                getfield Base/x I
                ireturn
            .end method

            .method public <init>()V
                .limit stack 2
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                aload_0
                bipush 10
                putfield Base/x I
                return
            .end method
        "}
    );
    assert_eq!(
        file(&files, "Derived.assembly"),
        indoc! {"
            .class public Derived
            .super Base
            .field public y I

            .method public <init>()V
                .limit stack 2
                .limit locals 1
                aload_0
                invokespecial Base/<init>()V
                aload_0
                bipush 20
                putfield Derived/y I
                return
            .end method
        "}
    );
}

#[test]
fn loops_branch_backwards_and_stay_stack_neutral() {
    let files = compile(indoc! {"
        class Loop is
            method factorial(n : Integer) : Integer is
                var result : Integer(1)
                var i : Integer(1)
                while i.LessEqual(n) loop
                    result := result.Mult(i)
                    i := i.Plus(Integer(1))
                end
                return result
            end
            this() is end
        end
    "});
    assert_eq!(
        file(&files, "Loop.assembly"),
        indoc! {"
            .class public Loop
            .super java/lang/Object

            .method public factorial(I)I
                .limit stack 2
                .limit locals 4
                iconst_1
                istore_2
                iconst_1
                istore_3
            Loop_factorial_cond_0:
                iload_3
                iload_1
                if_icmple Loop_factorial_cmptrue_2
                iconst_0
                goto Loop_factorial_cmpend_3
            Loop_factorial_cmptrue_2:
                iconst_1
            Loop_factorial_cmpend_3:
                ifeq Loop_factorial_endloop_1
                iload_2
                iload_3
                imul
                istore_2
                iload_3
                iconst_1
                iadd
                istore_3
                goto Loop_factorial_cond_0
            Loop_factorial_endloop_1:
                iload_2
                ireturn
            .end method

            .method public <init>()V
                .limit stack 1
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                return
            .end method
        "}
    );
}

#[test]
fn folded_initializer_pushes_the_constant_directly() {
    let files = compile(
        "class ConstFold is this() is var r : Integer(2).Plus(Integer(3)).Mult(Integer(4)) end end",
    );
    assert_eq!(
        file(&files, "ConstFold.assembly"),
        indoc! {"
            .class public ConstFold
            .super java/lang/Object

            .method public <init>()V
                .limit stack 1
                .limit locals 2
                aload_0
                invokespecial java/lang/Object/<init>()V
                bipush 20
                istore_1
                return
            .end method
        "}
    );
}

#[test]
fn printer_lowers_to_standard_output_and_entry_point_is_emitted() {
    let files = compile(indoc! {"
        class Start is
            method start() is
                var p : Printer()
                p.print(Integer(7))
            end
            this() is end
        end
    "});
    assert_eq!(files.len(), 2);
    assert_eq!(
        file(&files, "Start.assembly"),
        indoc! {"
            .class public Start
            .super java/lang/Object

            .method public start()V
                .limit stack 2
                .limit locals 2
                aconst_null
                astore_1
                aload_1
                pop
                getstatic java/lang/System/out Ljava/io/PrintStream;
                bipush 7
                invokevirtual java/io/PrintStream/println(I)V
                return
            .end method

            .method public <init>()V
                .limit stack 1
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                return
            .end method
        "}
    );
    assert_eq!(
        file(&files, "Main.assembly"),
        indoc! {"
            .class public Main
            .super java/lang/Object

            .method public static main([Ljava/lang/String;)V
                .limit stack 2
                .limit locals 1
                new Start
                dup
                invokespecial Start/<init>()V
                invokevirtual Start/start()V
                return
            .end method
        "}
    );
}

#[test]
fn no_entry_point_without_a_parameterless_void_start() {
    let files = compile(indoc! {"
        class Start is
            method start(n : Integer) is end
            this() is end
        end
    "});
    assert_eq!(files.len(), 1);

    let files = compile(indoc! {"
        class Start is
            method start() : Integer => Integer(1)
            this() is end
        end
    "});
    assert_eq!(files.len(), 1);
}

#[test]
fn wide_reals_take_two_slots() {
    let files = compile("class M is method avg(a : Real, b : Real) : Real => a.Plus(b) end");
    assert_eq!(
        file(&files, "M.assembly"),
        indoc! {"
            .class public M
            .super java/lang/Object

            .method public <init>()V
                .limit stack 1
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                return
            .end method

            .method public avg(DD)D
                .limit stack 4
                .limit locals 5
                dload_1
                dload_3
                dadd
                dreturn
            .end method
        "}
    );
}

#[test]
fn array_access_uses_element_typed_opcodes() {
    let files = compile(indoc! {"
        class Arr is
            method first(items : Array[Integer]) : Integer => items.get(Integer(0))
            method make(n : Integer) : Array[Real] => Array[Real](n)
            method store(items : Array[Integer], v : Integer) is
                items.set(Integer(0), v)
            end
            method size(items : Array[Integer]) : Integer => items.Length()
        end
    "});
    let text = file(&files, "Arr.assembly");
    assert!(text.contains(".method public first([I)I"));
    assert!(text.contains("iaload"));
    assert!(text.contains(".method public make(I)[D"));
    assert!(text.contains("newarray double"));
    assert!(text.contains(".method public store([II)V"));
    assert!(text.contains("iastore"));
    assert!(text.contains("arraylength"));
}

#[test]
fn user_method_calls_synthesize_descriptors() {
    let files = compile(indoc! {"
        class Point is
            var x : Integer(0)
            method getX() : Integer => x
            method shift(dx : Integer, dy : Real) : Point => this
            this() is end
        end
        class A is
            method go() : Integer is
                var p : Point()
                p.shift(Integer(1), Real(2.5))
                return p.getX()
            end
            this() is end
        end
    "});
    let text = file(&files, "A.assembly");
    assert!(text.contains("new Point"));
    assert!(text.contains("invokespecial Point/<init>()V"));
    assert!(text.contains("invokevirtual Point/shift(ID)LPoint;"));
    assert!(text.contains("invokevirtual Point/getX()I"));
    // The discarded Point result of shift is popped.
    assert!(text.contains("pop"));
}

#[test]
fn deep_expressions_grow_the_stack_limit() {
    let files = compile(indoc! {"
        class S is
            method deep(a : Integer, b : Integer, c : Integer) : Integer => a.Plus(b.Plus(c))
        end
    "});
    let text = file(&files, "S.assembly");
    assert!(text.contains(".limit stack 3"));
    assert!(text.contains(".limit locals 4"));
}

#[test]
fn if_else_branches() {
    let files = compile(indoc! {"
        class C is
            method max(a : Integer, b : Integer) : Integer is
                if a.Greater(b) then
                    return a
                else
                    return b
                end
            end
        end
    "});
    let text = file(&files, "C.assembly");
    assert_eq!(
        text,
        indoc! {"
            .class public C
            .super java/lang/Object

            .method public <init>()V
                .limit stack 1
                .limit locals 1
                aload_0
                invokespecial java/lang/Object/<init>()V
                return
            .end method

            .method public max(II)I
                .limit stack 2
                .limit locals 3
                iload_1
                iload_2
                if_icmpgt C_max_cmptrue_0
                iconst_0
                goto C_max_cmpend_1
            C_max_cmptrue_0:
                iconst_1
            C_max_cmpend_1:
                ifeq C_max_else_2
                iload_1
                ireturn
                goto C_max_endif_3
            C_max_else_2:
                iload_2
                ireturn
            C_max_endif_3:
            .end method
        "}
    );
}

#[test]
fn real_comparisons_and_conversions() {
    let files = compile(indoc! {"
        class R is
            method cmp(a : Real, b : Real) : Boolean => a.Less(b)
            method narrow(a : Real) : Integer => a.toInteger()
            method widen(a : Integer) : Real => a.toReal()
        end
    "});
    let text = file(&files, "R.assembly");
    assert!(text.contains("dcmpg"));
    assert!(text.contains("iflt R_cmp_cmptrue_0"));
    assert!(text.contains("d2i"));
    assert!(text.contains("i2d"));
}

#[test]
fn boolean_not_lowers_to_xor() {
    let files = compile("class B is method invert(a : Boolean) : Boolean => a.Not() end");
    let text = file(&files, "B.assembly");
    assert!(text.contains("iconst_1\n    ixor"));
}

#[test]
fn real_constants_use_compact_forms() {
    let files = compile(indoc! {"
        class R is
            this() is
                var zero : Real(0.0)
                var one : Real(1.0)
                var pi : Real(3.14)
            end
        end
    "});
    let text = file(&files, "R.assembly");
    assert!(text.contains("dconst_0"));
    assert!(text.contains("dconst_1"));
    assert!(text.contains("ldc2_w 3.14"));
    assert!(text.contains("dstore_1"));
    assert!(text.contains("dstore 5"));
}

#[test]
fn int_constant_calibration() {
    let files = compile(indoc! {"
        class K is
            this() is
                var a : Integer(-1)
                var b : Integer(5)
                var c : Integer(100)
                var d : Integer(1000)
                var e : Integer(100000)
            end
        end
    "});
    let text = file(&files, "K.assembly");
    assert!(text.contains("iconst_m1"));
    assert!(text.contains("iconst_5"));
    assert!(text.contains("bipush 100"));
    assert!(text.contains("sipush 1000"));
    assert!(text.contains("ldc 100000"));
}

#[test]
fn dead_code_is_gone_before_emission() {
    let files = compile(indoc! {"
        class D is
            method m() : Integer is
                return Integer(1)
                var dead : Integer(2)
            end
        end
    "});
    let text = file(&files, "D.assembly");
    assert!(!text.contains("iconst_2"));
    assert!(!text.contains("istore"));
}

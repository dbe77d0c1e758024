#[cfg(test)]
mod interpreter_tests {
    use obj_interpreter as obj;

    use obj::error::ObjError;
    use obj::interpreter::Interpreter;
    use obj::value::Value;

    /// Run a program and return the values of its top-level expression
    /// statements, as the driver would print them.
    fn run(source: &str) -> obj::error::Result<Vec<Value>> {
        Interpreter::new().run(source.as_bytes())
    }

    fn run_ok(source: &str) -> Vec<Value> {
        run(source).expect("program should evaluate")
    }

    // ─────────────────────── dispatch across binding modes ───────────────────────

    #[test]
    fn param_field_and_static_share_a_name() {
        // calc(1) = 1 (param) + 10 (field, set by init) + 100 (static)
        let values = run_ok(
            "class Widget\n\
               static x = 100\n\
               field x\n\
               method init = proc() { set <this>x = 10 ; this }\n\
               method calc = proc(x) +(x, +(<self>x, <myclass>x))\n\
             end\n\
             define w = .<new Widget>init()\n\
             .<w>calc(1)",
        );

        assert_eq!(values, vec![Value::Number(111)]);
    }

    #[test]
    fn self_call_dispatches_to_override() {
        let values = run_ok(
            "class Animal\n\
               method identify = proc() 1\n\
               method callWithSelf = proc() .<self>identify()\n\
             end\n\
             class Dog extends Animal\n\
               method identify = proc() 2\n\
             end\n\
             define d = new Dog\n\
             .<d>callWithSelf()",
        );

        assert_eq!(values, vec![Value::Number(2)]);
    }

    #[test]
    fn lexical_capture_sees_later_mutation() {
        // <!@>val reads the rebound outer binding (999), <myclass>val the
        // static (20): closure is by reference, not by snapshot.
        let values = run_ok(
            "define val = 10\n\
             class Window\n\
               static val = 20\n\
               field val\n\
               method init = proc() { set <this>val = 30 ; this }\n\
               method sum = proc() +(<!@>val, <myclass>val)\n\
             end\n\
             define w = .<new Window>init()\n\
             set val = 999\n\
             .<w>sum()",
        );

        assert_eq!(values, vec![Value::Number(1019)]);
    }

    #[test]
    fn superclass_static_and_super_method() {
        let values = run_ok(
            "class Base\n\
               static id = 1\n\
               method getID = proc() 10\n\
             end\n\
             class Derived extends Base\n\
               static id = 2\n\
               method getID = proc() 20\n\
               method test = proc() +(<superclass>id, .<super>getID())\n\
             end\n\
             define d = new Derived\n\
             .<d>test()",
        );

        assert_eq!(values, vec![Value::Number(11)]);
    }

    #[test]
    fn static_proc_reads_myclass() {
        let values = run_ok(
            "class Util\n\
               static x = 5\n\
               static method getX = proc() <myclass>x\n\
             end\n\
             .<Util>getX()",
        );

        assert_eq!(values, vec![Value::Number(5)]);
    }

    #[test]
    fn static_proc_has_no_receiver() {
        let result = run(
            "class Util\n\
               static x = 5\n\
               static method bad = proc() <self>x\n\
             end\n\
             .<Util>bad()",
        );

        assert!(matches!(
            result,
            Err(ObjError::NoReceiverInStaticContext { .. })
        ));
    }

    #[test]
    fn self_survives_a_super_chain() {
        // C.test -> B.test -> super -> A.test -> <self>foo() must still see
        // C's override.
        let values = run_ok(
            "class A\n\
               method foo = proc() 1\n\
               method test = proc() .<self>foo()\n\
             end\n\
             class B extends A\n\
               method foo = proc() 2\n\
               method test = proc() .<super>test()\n\
             end\n\
             class C extends B\n\
               method foo = proc() 3\n\
             end\n\
             define c = new C\n\
             .<c>test()",
        );

        assert_eq!(values, vec![Value::Number(3)]);
    }

    // ─────────────────────── field storage per level ───────────────────────

    #[test]
    fn inherited_field_keeps_ancestor_initializer() {
        let values = run_ok(
            "class A\n\
               field x = 5\n\
             end\n\
             class B extends A\n\
             end\n\
             define b = new B\n\
             <b>x",
        );

        assert_eq!(values, vec![Value::Number(5)]);
    }

    #[test]
    fn shadowed_fields_are_independent_per_level() {
        // <this> anchored in the parent reads the parent's slot; <self>
        // reads the most-derived one.
        let values = run_ok(
            "class P\n\
               field v = 1\n\
               method readAnchored = proc() <this>v\n\
             end\n\
             class C extends P\n\
               field v = 2\n\
               method readDerived = proc() <self>v\n\
             end\n\
             define c = new C\n\
             .<c>readAnchored()\n\
             .<c>readDerived()",
        );

        assert_eq!(values, vec![Value::Number(1), Value::Number(2)]);
    }

    #[test]
    fn unassigned_field_read_is_unbound() {
        let result = run(
            "class P\n\
               field x\n\
             end\n\
             define p = new P\n\
             <p>x",
        );

        assert!(matches!(result, Err(ObjError::UnboundIdentifier { .. })));
    }

    #[test]
    fn set_fills_a_declared_field_in_place() {
        let values = run_ok(
            "class P\n\
               field x\n\
             end\n\
             define p = new P\n\
             set <p>x = 41\n\
             add1(<p>x)",
        );

        assert_eq!(values, vec![Value::Number(41), Value::Number(42)]);
    }

    // ─────────────────────── static storage per level ───────────────────────

    #[test]
    fn child_static_does_not_alias_parent_static() {
        let values = run_ok(
            "class P\n\
               static s = 1\n\
             end\n\
             class C extends P\n\
               static s = 2\n\
             end\n\
             set <C>s = 20\n\
             <P>s\n\
             <C>s",
        );

        assert_eq!(
            values,
            vec![Value::Number(20), Value::Number(1), Value::Number(20)]
        );
    }

    #[test]
    fn parent_level_statics_are_shared_not_copied() {
        // Mutating through the parent's name is seen through the child's
        // superclass view: the level frame is one cell, shared by reference.
        let values = run_ok(
            "class P\n\
               static s = 1\n\
             end\n\
             class C extends P\n\
               method peek = proc() <superclass>s\n\
             end\n\
             set <P>s = 7\n\
             define c = new C\n\
             .<c>peek()",
        );

        assert_eq!(values, vec![Value::Number(7), Value::Number(7)]);
    }

    #[test]
    fn class_counter_increments_through_static() {
        let values = run_ok(
            "class Counter\n\
               static count = 0\n\
               field id\n\
               method init = proc()\n\
                 { set <Counter>count = add1(<Counter>count)\n\
                 ; set <this>id = <Counter>count\n\
                 ; this\n\
                 }\n\
             end\n\
             define a = .<new Counter>init()\n\
             define b = .<new Counter>init()\n\
             <a>id\n\
             <b>id\n\
             <Counter>count",
        );

        assert_eq!(
            values,
            vec![Value::Number(1), Value::Number(2), Value::Number(2)]
        );
    }

    #[test]
    fn myclass_static_is_exact_level_only() {
        // The child level declares no static 'x'; myclass must not fall
        // back to the parent's cell.
        let result = run(
            "class P\n\
               static x = 1\n\
             end\n\
             class C extends P\n\
               method read = proc() <myclass>x\n\
             end\n\
             define c = new C\n\
             .<c>read()",
        );

        assert!(matches!(result, Err(ObjError::UnboundIdentifier { .. })));
    }

    // ─────────────────────── closures and procs ───────────────────────

    #[test]
    fn closure_shares_its_captured_frame() {
        let values = run_ok(
            "define makeCounter = proc(start) proc() { set start = add1(start) ; start }\n\
             define tick = .makeCounter(10)\n\
             .tick()\n\
             .tick()",
        );

        assert_eq!(values, vec![Value::Number(11), Value::Number(12)]);
    }

    #[test]
    fn let_bindings_are_sequential() {
        let values = run_ok("let a = 2 b = *(a, 3) in +(a, b)");

        assert_eq!(values, vec![Value::Number(8)]);
    }

    #[test]
    fn lexical_assign_writes_through_the_capture() {
        let values = run_ok(
            "define total = 0\n\
             class Acc\n\
               method bump = proc(n) set <!@>total = +(<!@>total, n)\n\
             end\n\
             define a = new Acc\n\
             .<a>bump(5)\n\
             .<a>bump(7)\n\
             total",
        );

        assert_eq!(
            values,
            vec![Value::Number(5), Value::Number(12), Value::Number(12)]
        );
    }

    // ─────────────────────── registration errors ───────────────────────

    #[test]
    fn unknown_parent_is_reported() {
        let result = run("class C extends Ghost end");

        assert!(matches!(result, Err(ObjError::UnknownParent { .. })));
    }

    #[test]
    fn duplicate_class_is_reported() {
        let result = run("class C end class C end");

        assert!(matches!(result, Err(ObjError::DuplicateDefinition { .. })));
    }

    // ─────────────────────── misc runtime behavior ───────────────────────

    #[test]
    fn new_requires_a_class_value() {
        let result = run("define x = 1 new x");

        assert!(matches!(result, Err(ObjError::Runtime(_))));
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error() {
        let result = run(
            "class A\n\
               method id = proc(x) x\n\
             end\n\
             define a = new A\n\
             .<a>id(1, 2)",
        );

        assert!(matches!(result, Err(ObjError::Runtime(_))));
    }

    #[test]
    fn super_without_parent_is_a_runtime_error() {
        let result = run(
            "class A\n\
               method go = proc() .<super>go()\n\
             end\n\
             define a = new A\n\
             .<a>go()",
        );

        assert!(matches!(result, Err(ObjError::Runtime(_))));
    }

    #[test]
    fn if_treats_zero_and_nil_as_false() {
        let values = run_ok("if 0 then 1 else 2\nif nil then 1 else 2\nif 7 then 1 else 2");

        assert_eq!(
            values,
            vec![Value::Number(2), Value::Number(2), Value::Number(1)]
        );
    }

    #[test]
    fn division_by_zero_is_reported() {
        let result = run("/(1, 0)");

        assert!(matches!(result, Err(ObjError::Runtime(_))));
    }

    #[test]
    fn undefined_variable_is_unbound() {
        let result = run("ghost");

        assert!(matches!(result, Err(ObjError::UnboundIdentifier { .. })));
    }

    #[test]
    fn this_call_starts_at_the_anchor_not_the_receiver() {
        // A's run uses <this>step; C overrides step, but the anchored call
        // must not jump back down to the override.
        let values = run_ok(
            "class A\n\
               method step = proc() 1\n\
               method run = proc() .<this>step()\n\
             end\n\
             class C extends A\n\
               method step = proc() 2\n\
             end\n\
             define c = new C\n\
             .<c>run()",
        );

        assert_eq!(values, vec![Value::Number(1)]);
    }

    #[test]
    fn methods_are_found_upward_from_the_receiver() {
        let values = run_ok(
            "class A\n\
               method hello = proc() 42\n\
             end\n\
             class B extends A\n\
             end\n\
             define b = new B\n\
             .<b>hello()",
        );

        assert_eq!(values, vec![Value::Number(42)]);
    }

    #[test]
    fn init_returns_this_for_chaining() {
        let values = run_ok(
            "class Point\n\
               field x\n\
               field y\n\
               method init = proc(a, b)\n\
                 { set <this>x = a\n\
                 ; set <this>y = b\n\
                 ; this\n\
                 }\n\
               method dist2 = proc() +(*(<this>x, <this>x), *(<this>y, <this>y))\n\
             end\n\
             define p = .<new Point>init(3, 4)\n\
             .<p>dist2()",
        );

        assert_eq!(values, vec![Value::Number(25)]);
    }
}

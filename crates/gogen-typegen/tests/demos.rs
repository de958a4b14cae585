//! The sample templates under `demos/` load and render the sample input.

use gogen_typegen::{Config, Generator, input};
use std::path::{Path, PathBuf};

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn render(template: &str, config: Config) -> String {
    let dir = demos();
    let source = std::fs::read_to_string(dir.join("input.go")).unwrap();
    let unit = input::parse_go_file("input.go", &source).unwrap();

    let mut generator = Generator::new(config);
    generator
        .load_template_file(&dir.join("templates").join(template))
        .unwrap();
    generator.generate_to_string(&unit).unwrap()
}

#[test]
fn typescript_interfaces() {
    let mut config = Config::new();
    config.load_file(&demos().join("gogen.yaml")).unwrap();
    let out = render("typescript.tmpl", config);

    assert!(out.starts_with("// Code generated by gogen from package library."));
    assert!(out.contains("/**\n * Member is a registered library patron.\n"));
    assert!(out.contains("export interface Member {\n  // ID is assigned on registration.\n  id: string;\n"));
    assert!(out.contains("  phone?: string | null;\n"));
    assert!(out.contains("  createdAt: Date;\n  updatedAt?: Date | null;\n}"));
    assert!(out.contains("export type Format = string;"));
    assert!(!out.contains("Shelf"));
    assert!(!out.contains("cacheEntry"));
}

#[test]
fn zod_schemas() {
    let out = render("zod.tmpl", Config::new());
    assert!(out.contains("  email: z.string().email(),\n"));
    assert!(out.contains("  authors: z.array(z.string()),\n"));
    assert!(out.contains("  extra: z.record(z.string(), z.string()).optional(),\n"));
    assert!(out.contains("  returned: z.string().nullable().optional(),\n"));
    assert!(out.contains("export const ShelfSchema = z.string();"));
    assert!(out.contains("export type Loan = z.infer<typeof LoanSchema>;"));
}

#[test]
fn valibot_forms_per_type() {
    let mut config = Config::new();
    config.options.per_type = true;
    config.options.include_types.insert("Member".into());
    let out = render("valibot.tmpl", config);

    assert!(out.contains("export const memberFormSchema = v.object({\n"));
    assert!(out.contains("  email: v.pipe(v.optional(v.string(), ''), v.email()),\n"));
    assert!(out.contains(
        "  fullName: v.pipe(v.optional(v.string(), ''), v.minLength(2), v.maxLength(80)),\n"
    ));
    assert!(out.contains("  maxLoans: v.pipe(v.optional(v.number(), 0), v.minValue(1), v.maxValue(20)),\n"));
    assert!(out.contains("  phone: v.nullable(v.string()),\n"));
    assert!(out.contains("export type MemberForm = v.InferOutput<typeof memberFormSchema>;"));
}

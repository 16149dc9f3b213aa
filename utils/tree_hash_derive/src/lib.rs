#![recursion_limit = "256"]

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields};

#[proc_macro_derive(TreeHash, attributes(tree_hash))]
pub fn tree_hash_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("AST should be correct");

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = &ast.generics.split_for_impl();
    let fields = extract_fields(&ast.data);

    let mut leaf_pushes = Vec::with_capacity(fields.len());
    let mut is_fixed_lens = Vec::with_capacity(fields.len());
    for field in &fields {
        let field_type = &field.ty;
        let field_name = field_ident(field);

        leaf_pushes.push(quote! {
            leaves.push(self.#field_name.tree_hash_root(hash_fn));
        });

        is_fixed_lens.push(quote! {
            <#field_type as tree_hash::TreeHash>::is_tree_hash_fixed_len()
        });
    }

    let fields_count = fields.len();

    let mut generated = quote! {
        impl #impl_generics tree_hash::TreeHash for #name #ty_generics #where_clause {
            fn is_tree_hash_fixed_len() -> bool {
                #(
                    #is_fixed_lens &&
                )*
                    true
            }

            fn tree_hash_root(&self, hash_fn: &dyn tree_hash::HashFn) -> ethereum_types::H256 {
                let mut leaves: Vec<ethereum_types::H256> = Vec::with_capacity(#fields_count);
                #(
                    #leaf_pushes
                )*
                tree_hash::merkleize(&leaves, hash_fn)
            }
        }
    };

    if let Some(signature_field) = fields.iter().find(|field| is_signature_field(field)) {
        let signature_name = field_ident(signature_field);
        let mut signed_leaf_pushes = Vec::with_capacity(fields.len());
        for field in &fields {
            if is_signature_field(field) {
                continue;
            }
            let field_name = field_ident(field);
            signed_leaf_pushes.push(quote! {
                leaves.push(self.#field_name.tree_hash_root(hash_fn));
            });
        }
        let _ = signature_name;

        generated.extend(quote! {
            impl #impl_generics tree_hash::SignedRoot for #name #ty_generics #where_clause {
                fn signed_root(&self, hash_fn: &dyn tree_hash::HashFn) -> ethereum_types::H256 {
                    let mut leaves: Vec<ethereum_types::H256> = Vec::new();
                    #(
                        #signed_leaf_pushes
                    )*
                    tree_hash::merkleize(&leaves, hash_fn)
                }
            }
        });
    }

    generated.into()
}

fn field_ident(field: &Field) -> &syn::Ident {
    field.ident.as_ref().expect("all fields must have names")
}

fn is_signature_field(field: &Field) -> bool {
    if field.ident.as_ref().map(|i| i == "signature").unwrap_or(false) {
        return true;
    }
    field.attrs.iter().any(|attr| {
        attr.path.is_ident("tree_hash")
            && attr.tts.to_string().replace(" ", "") == "(signed_root_skip_hashing)"
    })
}

fn extract_fields(data: &Data) -> Vec<&Field> {
    match data {
        Data::Struct(struct_data) => match &struct_data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            _ => panic!("TreeHash only available for structs with named fields"),
        },
        _ => panic!("TreeHash only available for structs"),
    }
}
